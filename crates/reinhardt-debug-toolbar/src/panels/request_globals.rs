//! Request globals panel
//!
//! Shows the values handlers stored with [`Recorder::set_global`].

use super::{Panel, PanelDescriptor, REQUEST_GLOBALS_PANEL};
use crate::capture::Recorder;
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(REQUEST_GLOBALS_PANEL, "RequestGlobals", |init| {
		Ok(Box::new(RequestGlobalsPanel {
			context: init.context.clone(),
			recorder: init.recorder.clone(),
		}) as Box<dyn Panel>)
	})
}

/// Key/value pairs a request stored for its own lifetime.
pub struct RequestGlobalsPanel {
	context: tera::Context,
	recorder: Recorder,
}

impl Panel for RequestGlobalsPanel {
	fn name(&self) -> &str {
		"RequestGlobals"
	}

	fn nav_title(&self) -> String {
		"Request globals".to_string()
	}

	fn nav_subtitle(&self) -> String {
		match self.recorder.globals().len() {
			1 => "1 value".to_string(),
			n => format!("{} values", n),
		}
	}

	fn title(&self) -> String {
		"Request globals content".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let values: BTreeMap<String, String> = self
			.recorder
			.globals()
			.into_iter()
			.map(|(key, value)| {
				let shown = match value {
					Value::String(s) => s,
					other => other.to_string(),
				};
				(key, shown)
			})
			.collect();
		let mut context = self.context.clone();
		context.insert("values", &values);
		templates.render("panels/request_globals.html", &context)
	}
}
