//! Template editor views and cache

use super::{STATIC_PATH, VIEWS_PATH};
use crate::capture::RenderedTemplate;
use crate::context::ToolbarServices;
use crate::error::{ToolbarError, ToolbarResult};
use crate::ui::ToolbarTemplates;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use http::StatusCode;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of requests whose templates stay editable.
pub const EDITOR_CACHE_CAPACITY: usize = 5;

/// Base path of the template editor.
pub fn editor_path() -> String {
	format!("{VIEWS_PATH}template/")
}

/// Templates of the most recent requests that rendered any, keyed by a
/// per-request editor key. The oldest entry is evicted first.
#[derive(Debug, Default)]
pub struct TemplateEditorCache {
	entries: Mutex<VecDeque<(String, Vec<RenderedTemplate>)>>,
}

impl TemplateEditorCache {
	/// Store the templates of one request.
	pub fn push(&self, key: impl Into<String>, templates: Vec<RenderedTemplate>) {
		let mut entries = self.entries.lock();
		if entries.len() == EDITOR_CACHE_CAPACITY {
			entries.pop_front();
		}
		entries.push_back((key.into(), templates));
	}

	/// Templates stored under `key`.
	pub fn get(&self, key: &str) -> Option<Vec<RenderedTemplate>> {
		self.entries
			.lock()
			.iter()
			.find(|(cached, _)| cached == key)
			.map(|(_, templates)| templates.clone())
	}

	/// Number of cached requests
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Whether the cache is empty
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

/// Form posted by the editor.
#[derive(Debug, Deserialize)]
pub struct EditorForm {
	/// Edited template source
	pub content: String,
}

#[derive(Serialize)]
struct EditableTemplate {
	name: String,
	path: Option<String>,
	source: String,
}

/// Routes of the template panel.
pub fn routes() -> Router<Arc<ToolbarServices>> {
	let base = editor_path();
	Router::new()
		.route(
			&format!("{base}{{key}}"),
			get(template_editor).post(template_preview),
		)
		.route(&format!("{base}{{key}}/save"), post(save_template))
}

fn require_enabled(services: &ToolbarServices) -> ToolbarResult<()> {
	if services.config().template_editor_enabled {
		Ok(())
	} else {
		Err(ToolbarError::EditorDisabled)
	}
}

fn cached(services: &ToolbarServices, key: &str) -> ToolbarResult<Vec<RenderedTemplate>> {
	services
		.editor()
		.get(key)
		.ok_or_else(|| ToolbarError::NotFound(format!("no templates cached under '{}'", key)))
}

async fn read_source(template: &RenderedTemplate) -> String {
	let Some(path) = &template.path else {
		return String::new();
	};
	match tokio::fs::read_to_string(path).await {
		Ok(source) => source,
		Err(err) => {
			tracing::warn!(path = %path.display(), error = %err, "could not read template source");
			String::new()
		}
	}
}

async fn template_editor(
	State(services): State<Arc<ToolbarServices>>,
	Path(key): Path<String>,
) -> ToolbarResult<Html<String>> {
	require_enabled(&services)?;
	let templates = cached(&services, &key)?;

	let mut editable = Vec::with_capacity(templates.len());
	for template in &templates {
		editable.push(EditableTemplate {
			name: template.name.clone(),
			path: template.path.as_ref().map(|p| p.display().to_string()),
			source: read_source(template).await,
		});
	}

	let mut context = tera::Context::new();
	context.insert("static_path", STATIC_PATH);
	context.insert("editor_path", &editor_path());
	context.insert("key", &key);
	context.insert("templates", &editable);
	services
		.templates()
		.render("template_editor.html", &context)
		.map(Html)
}

async fn template_preview(
	State(services): State<Arc<ToolbarServices>>,
	Path(key): Path<String>,
	Form(form): Form<EditorForm>,
) -> ToolbarResult<Response> {
	require_enabled(&services)?;
	let templates = cached(&services, &key)?;
	let first = templates
		.first()
		.ok_or_else(|| ToolbarError::NotFound(key.clone()))?;

	let context = tera::Context::from_value(first.context.clone())
		.unwrap_or_else(|_| tera::Context::new());
	match ToolbarTemplates::render_source(&form.content, &context) {
		Ok(html) => Ok(Html(html).into_response()),
		Err(err) => Ok((
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({ "error": err.to_string() })),
		)
			.into_response()),
	}
}

async fn save_template(
	State(services): State<Arc<ToolbarServices>>,
	Path(key): Path<String>,
	Form(form): Form<EditorForm>,
) -> ToolbarResult<&'static str> {
	require_enabled(&services)?;
	let templates = cached(&services, &key)?;
	let path = templates
		.first()
		.and_then(|template| template.path.clone())
		.ok_or_else(|| ToolbarError::BadRequest("template has no source file".to_string()))?;

	tokio::fs::write(&path, form.content.as_bytes()).await?;
	tracing::debug!(path = %path.display(), "template saved from the debug toolbar");
	Ok("ok")
}
