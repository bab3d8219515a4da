//! Version panel

use super::{Panel, PanelDescriptor, PanelInit, VERSION_PANEL};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;

/// Version of this crate.
pub const TOOLBAR_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(VERSION_PANEL, "Version", |init| {
		Ok(Box::new(VersionPanel::new(init)) as Box<dyn Panel>)
	})
}

/// Shows the toolbar version and the package versions the host registered.
pub struct VersionPanel {
	packages: Vec<(String, String)>,
	context: tera::Context,
}

impl VersionPanel {
	/// Create the panel for one request.
	pub fn new(init: &PanelInit) -> Self {
		let mut packages = init.services.packages().to_vec();
		packages.sort_by_key(|(name, _)| name.to_lowercase());
		Self {
			packages,
			context: init.context.clone(),
		}
	}
}

impl Panel for VersionPanel {
	fn name(&self) -> &str {
		"Version"
	}

	fn nav_title(&self) -> String {
		"Versions".to_string()
	}

	fn nav_subtitle(&self) -> String {
		format!("Reinhardt {}", TOOLBAR_VERSION)
	}

	fn title(&self) -> String {
		"Versions".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let mut context = self.context.clone();
		context.insert("toolbar_version", TOOLBAR_VERSION);
		context.insert("packages", &self.packages);
		templates.render("panels/versions.html", &context)
	}
}
