//! Route list panel

use super::{Panel, PanelDescriptor, ROUTE_LIST_PANEL};
use crate::context::{RequestInfo, RouteInfo, ToolbarServices};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use crate::utils::html::pluralize;
use crate::views::TOOLBAR_PREFIX;
use std::sync::Arc;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(ROUTE_LIST_PANEL, "RouteList", |init| {
		Ok(Box::new(RouteListPanel {
			services: Arc::clone(&init.services),
			context: init.context.clone(),
			routes: Vec::new(),
		}) as Box<dyn Panel>)
	})
}

/// Routes of the host application, without the toolbar's own.
pub struct RouteListPanel {
	services: Arc<ToolbarServices>,
	context: tera::Context,
	routes: Vec<RouteInfo>,
}

impl Panel for RouteListPanel {
	fn name(&self) -> &str {
		"RouteList"
	}

	fn nav_title(&self) -> String {
		"Route List".to_string()
	}

	fn nav_subtitle(&self) -> String {
		pluralize(self.routes.len(), "route", "routes")
	}

	fn title(&self) -> String {
		"Route List".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let mut context = self.context.clone();
		context.insert("routes", &self.routes);
		templates.render("panels/route_list.html", &context)
	}

	fn process_request(&mut self, _request: &RequestInfo) {
		self.routes = self
			.services
			.routes()
			.iter()
			.filter(|route| !route.path.starts_with(TOOLBAR_PREFIX))
			.cloned()
			.collect();
	}
}
