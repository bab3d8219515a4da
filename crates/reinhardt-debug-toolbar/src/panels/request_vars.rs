//! Request variables panel

use super::{Panel, PanelDescriptor, REQUEST_VARS_PANEL, ViewHandler};
use crate::context::RequestInfo;
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use serde::Serialize;
use std::collections::BTreeMap;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(REQUEST_VARS_PANEL, "RequestVars", |init| {
		Ok(Box::new(RequestVarsPanel::new(init.context.clone())) as Box<dyn Panel>)
	})
}

/// Extract `{name}` and `{*name}` captures of a route pattern from a path.
///
/// Returns an empty map when the path does not fit the pattern.
pub fn path_params(pattern: &str, path: &str) -> BTreeMap<String, String> {
	let mut params = BTreeMap::new();
	let mut pattern_segments = pattern.trim_matches('/').split('/');
	let mut path_segments = path.trim_matches('/').split('/');

	loop {
		match (pattern_segments.next(), path_segments.next()) {
			(None, None) => return params,
			(Some(segment), Some(value)) => {
				if let Some(name) = segment
					.strip_prefix("{*")
					.and_then(|rest| rest.strip_suffix('}'))
				{
					let rest: Vec<&str> = std::iter::once(value).chain(path_segments).collect();
					params.insert(name.to_string(), rest.join("/"));
					return params;
				}
				if let Some(name) = segment
					.strip_prefix('{')
					.and_then(|rest| rest.strip_suffix('}'))
				{
					params.insert(name.to_string(), value.to_string());
				} else if segment != value {
					return BTreeMap::new();
				}
			}
			_ => return BTreeMap::new(),
		}
	}
}

#[derive(Serialize)]
struct Section {
	title: &'static str,
	empty: &'static str,
	rows: Vec<(String, String)>,
}

/// Query arguments, cookies and the matched route of the request.
pub struct RequestVarsPanel {
	context: tera::Context,
	query_args: Vec<(String, String)>,
	cookies: Vec<(String, String)>,
	view_func: Option<String>,
	view_kwargs: BTreeMap<String, String>,
}

impl RequestVarsPanel {
	fn new(context: tera::Context) -> Self {
		Self {
			context,
			query_args: Vec::new(),
			cookies: Vec::new(),
			view_func: None,
			view_kwargs: BTreeMap::new(),
		}
	}

	/// Route the request was dispatched to, `[unknown]` when not known.
	pub fn view_func(&self) -> &str {
		self.view_func.as_deref().unwrap_or("[unknown]")
	}
}

impl Panel for RequestVarsPanel {
	fn name(&self) -> &str {
		"RequestVars"
	}

	fn nav_title(&self) -> String {
		"Request Vars".to_string()
	}

	fn title(&self) -> String {
		"Request Vars".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let sections = [
			Section {
				title: "GET Variables",
				empty: "GET",
				rows: self.query_args.clone(),
			},
			Section {
				title: "Cookie Variables",
				empty: "cookie",
				rows: self.cookies.clone(),
			},
		];
		let mut context = self.context.clone();
		context.insert("view_func", self.view_func());
		context.insert("view_kwargs", &self.view_kwargs);
		context.insert("sections", &sections);
		templates.render("panels/request_vars.html", &context)
	}

	fn process_request(&mut self, request: &RequestInfo) {
		self.query_args = request.query_args();
		self.cookies = request.cookies();
		self.view_func = None;
		self.view_kwargs.clear();
	}

	fn process_view(&mut self, request: &RequestInfo, _view: ViewHandler) -> Option<ViewHandler> {
		if let Some(pattern) = &request.matched_path {
			self.view_kwargs = path_params(pattern, request.path());
			self.view_func = Some(format!("{} {}", request.method, pattern));
		}
		None
	}
}
