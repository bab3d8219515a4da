//! Embedded toolbar templates

use crate::error::ToolbarResult;
use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
	("base.html", include_str!("../../templates/base.html")),
	("redirect.html", include_str!("../../templates/redirect.html")),
	("sql_select.html", include_str!("../../templates/sql_select.html")),
	(
		"template_editor.html",
		include_str!("../../templates/template_editor.html"),
	),
	(
		"panels/versions.html",
		include_str!("../../templates/panels/versions.html"),
	),
	(
		"panels/timer.html",
		include_str!("../../templates/panels/timer.html"),
	),
	(
		"panels/headers.html",
		include_str!("../../templates/panels/headers.html"),
	),
	(
		"panels/request_vars.html",
		include_str!("../../templates/panels/request_vars.html"),
	),
	(
		"panels/config_vars.html",
		include_str!("../../templates/panels/config_vars.html"),
	),
	(
		"panels/template.html",
		include_str!("../../templates/panels/template.html"),
	),
	("panels/sql.html", include_str!("../../templates/panels/sql.html")),
	(
		"panels/sql_unavailable.html",
		include_str!("../../templates/panels/sql_unavailable.html"),
	),
	(
		"panels/logger.html",
		include_str!("../../templates/panels/logger.html"),
	),
	(
		"panels/route_list.html",
		include_str!("../../templates/panels/route_list.html"),
	),
	(
		"panels/profiler.html",
		include_str!("../../templates/panels/profiler.html"),
	),
	(
		"panels/request_globals.html",
		include_str!("../../templates/panels/request_globals.html"),
	),
];

/// Template engine holding the toolbar's own templates.
#[derive(Debug, Clone)]
pub struct ToolbarTemplates {
	tera: Tera,
}

impl ToolbarTemplates {
	/// Parse the embedded templates.
	pub fn new() -> ToolbarResult<Self> {
		let mut tera = Tera::default();
		tera.add_raw_templates(TEMPLATES.iter().copied())?;
		tera.autoescape_on(vec![".html"]);
		Ok(Self { tera })
	}

	/// Render a named template.
	pub fn render(&self, name: &str, context: &Context) -> ToolbarResult<String> {
		Ok(self.tera.render(name, context)?)
	}

	/// Render template source that is not part of the toolbar, with
	/// autoescaping on.
	pub fn render_source(source: &str, context: &Context) -> ToolbarResult<String> {
		Ok(Tera::one_off(source, context, true)?)
	}

	/// Names of the embedded templates
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.tera.get_template_names()
	}
}
