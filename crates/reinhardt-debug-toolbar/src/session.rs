//! Diagnostic session of one request
//!
//! A [`ToolbarSession`] owns the panel instances created for a single request,
//! drives their lifecycle hooks and renders the toolbar markup.

use crate::capture::Recorder;
use crate::context::{RequestInfo, ResponseInfo, ToolbarServices};
use crate::error::ToolbarResult;
use crate::panels::{Panel, PanelInit, PanelRegistry, ViewHandler};
use crate::store::RequestId;
use crate::ui::ToolbarTemplates;
use crate::utils::html::html_escape;
use crate::views::STATIC_PATH;
use http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;

/// Cookie listing the DOM ids of panels switched on by the user.
pub const ACTIVATION_COOKIE: &str = "fldt_active";

/// DOM ids listed in the activation cookie.
///
/// The cookie value is percent-decoded and split on `;`. A missing or empty
/// cookie yields an empty list.
pub fn parse_activation_cookie(headers: &HeaderMap) -> Vec<String> {
	let raw = headers
		.get_all(http::header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, _)| name.trim() == ACTIVATION_COOKIE)
		.map(|(_, value)| value.trim().trim_matches('"').to_string());

	let Some(raw) = raw else {
		return Vec::new();
	};
	let decoded = urlencoding::decode(&raw)
		.map(|decoded| decoded.into_owned())
		.unwrap_or(raw);
	decoded
		.split(';')
		.filter(|id| !id.is_empty())
		.map(str::to_string)
		.collect()
}

struct PanelSlot {
	identifier: String,
	panel: Box<dyn Panel>,
	active: bool,
}

/// Panel data handed to `base.html`.
#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
	/// Panel identifier
	pub identifier: String,
	/// DOM id
	pub dom_id: String,
	/// Display name
	pub name: String,
	/// Toolbar title
	pub nav_title: String,
	/// Toolbar subtitle
	pub nav_subtitle: String,
	/// Panel title
	pub title: String,
	/// Whether the panel opens
	pub has_content: bool,
	/// Rendered panel body
	pub content: String,
	/// Whether the user can toggle the panel
	pub user_activate: bool,
	/// Whether the panel is active
	pub is_active: bool,
}

/// Panels and shared render context of one request.
pub struct ToolbarSession {
	request_id: RequestId,
	slots: Vec<PanelSlot>,
	context: tera::Context,
	recorder: Recorder,
	services: Arc<ToolbarServices>,
}

impl ToolbarSession {
	/// Instantiate the configured panels for a request.
	///
	/// Unresolvable identifiers and failing factories are skipped; the
	/// remaining panels keep the configured order.
	pub fn create(
		request_id: RequestId,
		activated: &[String],
		registry: &PanelRegistry,
		services: Arc<ToolbarServices>,
		recorder: Recorder,
	) -> Self {
		let mut context = tera::Context::new();
		context.insert("static_path", STATIC_PATH);

		let init = PanelInit {
			services: Arc::clone(&services),
			recorder: recorder.clone(),
			request_id,
			context: context.clone(),
		};

		let mut slots = Vec::new();
		for descriptor in registry.iter_panels(&services.config().panels) {
			let mut panel = match descriptor.create(&init) {
				Ok(panel) => panel,
				Err(err) => {
					tracing::warn!(
						panel = descriptor.identifier(),
						error = %err,
						"skipping debug toolbar panel"
					);
					continue;
				}
			};
			let active = panel.is_active() || activated.contains(&panel.dom_id());
			if active {
				panel.activate();
			}
			slots.push(PanelSlot {
				identifier: descriptor.identifier().to_string(),
				panel,
				active,
			});
		}

		Self {
			request_id,
			slots,
			context,
			recorder,
			services,
		}
	}

	/// Request this session belongs to
	pub fn request_id(&self) -> RequestId {
		self.request_id
	}

	/// Capture sink of the request
	pub fn recorder(&self) -> &Recorder {
		&self.recorder
	}

	/// Services the session was created with
	pub fn services(&self) -> &Arc<ToolbarServices> {
		&self.services
	}

	/// Identifiers of the instantiated panels, in order.
	pub fn identifiers(&self) -> Vec<&str> {
		self.slots.iter().map(|slot| slot.identifier.as_str()).collect()
	}

	/// DOM ids of the instantiated panels, in order.
	pub fn dom_ids(&self) -> Vec<String> {
		self.slots.iter().map(|slot| slot.panel.dom_id()).collect()
	}

	/// Whether the panel with this DOM id is active.
	pub fn is_active(&self, dom_id: &str) -> bool {
		self.slots
			.iter()
			.any(|slot| slot.active && slot.panel.dom_id() == dom_id)
	}

	/// Run every panel's request hook.
	pub fn process_request(&mut self, request: &RequestInfo) {
		for slot in &mut self.slots {
			slot.panel.process_request(request);
		}
	}

	/// Let every panel wrap the view, in panel order.
	pub fn process_view(&mut self, request: &RequestInfo, mut view: ViewHandler) -> ViewHandler {
		for slot in &mut self.slots {
			if let Some(wrapped) = slot.panel.process_view(request, view.clone()) {
				view = wrapped;
			}
		}
		view
	}

	/// Run every panel's response hook.
	pub fn process_response(&mut self, request: &RequestInfo, response: &ResponseInfo) {
		for slot in &mut self.slots {
			slot.panel.process_response(request, response);
		}
	}

	/// Panel data for rendering; content failures become an error message.
	pub fn panel_views(&self, templates: &ToolbarTemplates) -> Vec<PanelView> {
		self.slots
			.iter()
			.map(|slot| {
				let panel = &slot.panel;
				let has_content = panel.has_content();
				let content = if has_content {
					panel.content(templates).unwrap_or_else(|err| {
						tracing::warn!(panel = %slot.identifier, error = %err, "panel content failed to render");
						format!(
							"<p class=\"flDebugError\">{}</p>",
							html_escape(&err.to_string())
						)
					})
				} else {
					String::new()
				};
				PanelView {
					identifier: slot.identifier.clone(),
					dom_id: panel.dom_id(),
					name: panel.name().to_string(),
					nav_title: panel.nav_title(),
					nav_subtitle: panel.nav_subtitle(),
					title: panel.title(),
					has_content,
					content,
					user_activate: panel.user_activate(),
					is_active: slot.active,
				}
			})
			.collect()
	}

	/// Render the toolbar markup.
	pub fn render(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let mut context = self.context.clone();
		context.insert("panels", &self.panel_views(templates));
		templates.render("base.html", &context)
	}
}

impl std::fmt::Debug for ToolbarSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToolbarSession")
			.field("request_id", &self.request_id)
			.field("panels", &self.identifiers())
			.finish_non_exhaustive()
	}
}
