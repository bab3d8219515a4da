//! Configuration panel

use super::{CONFIG_VARS_PANEL, Panel, PanelDescriptor};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(CONFIG_VARS_PANEL, "ConfigVars", |init| {
		Ok(Box::new(ConfigVarsPanel {
			context: init.context.clone(),
			toolbar: init.services.config().display_values(),
			application: init.services.app_config().clone(),
		}) as Box<dyn Panel>)
	})
}

#[derive(Serialize)]
struct Section {
	title: &'static str,
	values: BTreeMap<String, String>,
}

fn display(values: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
	values
		.iter()
		.map(|(key, value)| {
			let shown = match value {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			};
			(key.clone(), shown)
		})
		.collect()
}

/// Toolbar configuration and the configuration the host registered.
pub struct ConfigVarsPanel {
	context: tera::Context,
	toolbar: BTreeMap<String, Value>,
	application: BTreeMap<String, Value>,
}

impl Panel for ConfigVarsPanel {
	fn name(&self) -> &str {
		"ConfigVars"
	}

	fn nav_title(&self) -> String {
		"Config".to_string()
	}

	fn title(&self) -> String {
		"Config".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let sections = [
			Section {
				title: "Application",
				values: display(&self.application),
			},
			Section {
				title: "Debug toolbar",
				values: display(&self.toolbar),
			},
		];
		let mut context = self.context.clone();
		context.insert("sections", &sections);
		templates.render("panels/config_vars.html", &context)
	}
}
