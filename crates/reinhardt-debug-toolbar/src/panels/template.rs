//! Template panel

use super::{Panel, PanelDescriptor, PanelInit, TEMPLATE_PANEL};
use crate::capture::Recorder;
use crate::context::{RequestInfo, ResponseInfo, ToolbarServices};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use crate::views::template::{editor_path, routes};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(TEMPLATE_PANEL, "Template", |init| {
		Ok(Box::new(TemplatePanel::new(init)) as Box<dyn Panel>)
	})
	.with_routes(|_| Ok(Some(routes())))
}

#[derive(Serialize)]
struct TemplateRow {
	name: String,
	path: Option<String>,
	context: String,
}

/// Templates rendered while handling the request.
///
/// When the template editor is enabled, the request's templates are kept in
/// the editor cache under a per-request key.
pub struct TemplatePanel {
	key: String,
	recorder: Recorder,
	services: Arc<ToolbarServices>,
	context: tera::Context,
}

impl TemplatePanel {
	/// Create the panel for one request.
	pub fn new(init: &PanelInit) -> Self {
		Self {
			key: Uuid::new_v4().to_string(),
			recorder: init.recorder.clone(),
			services: Arc::clone(&init.services),
			context: init.context.clone(),
		}
	}

	/// Key of this request in the editor cache
	pub fn key(&self) -> &str {
		&self.key
	}

	fn editable(&self) -> bool {
		self.services.config().template_editor_enabled
	}
}

impl Panel for TemplatePanel {
	fn name(&self) -> &str {
		"Template"
	}

	fn nav_title(&self) -> String {
		"Templates".to_string()
	}

	fn nav_subtitle(&self) -> String {
		format!("{} rendered", self.recorder.templates().len())
	}

	fn title(&self) -> String {
		"Templates".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let rows: Vec<TemplateRow> = self
			.recorder
			.templates()
			.into_iter()
			.map(|template| TemplateRow {
				name: template.name,
				path: template.path.map(|p| p.display().to_string()),
				context: serde_json::to_string_pretty(&template.context).unwrap_or_default(),
			})
			.collect();

		let mut context = self.context.clone();
		context.insert("key", &self.key);
		context.insert("templates", &rows);
		context.insert("editable", &self.editable());
		context.insert("editor_path", &editor_path());
		templates.render("panels/template.html", &context)
	}

	fn process_response(&mut self, _request: &RequestInfo, _response: &ResponseInfo) {
		if !self.editable() {
			return;
		}
		let rendered = self.recorder.templates();
		if !rendered.is_empty() {
			self.services.editor().push(self.key.clone(), rendered);
		}
	}
}
