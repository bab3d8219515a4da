//! HTTP headers panel

use super::{HEADERS_PANEL, Panel, PanelDescriptor};
use crate::context::RequestInfo;
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;

/// Request headers shown by the panel.
pub const HEADER_FILTER: &[&str] = &[
	"content-type",
	"accept",
	"accept-charset",
	"accept-encoding",
	"accept-language",
	"cache-control",
	"connection",
	"host",
	"keep-alive",
	"referer",
	"user-agent",
];

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(HEADERS_PANEL, "Header", |init| {
		Ok(Box::new(HeadersPanel {
			context: init.context.clone(),
			headers: Vec::new(),
		}) as Box<dyn Panel>)
	})
}

/// Selected request headers and request line facts.
pub struct HeadersPanel {
	context: tera::Context,
	headers: Vec<(String, String)>,
}

impl HeadersPanel {
	/// Collected `(name, value)` rows
	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}
}

impl Panel for HeadersPanel {
	fn name(&self) -> &str {
		"Header"
	}

	fn nav_title(&self) -> String {
		"HTTP Headers".to_string()
	}

	fn title(&self) -> String {
		"HTTP Headers".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let mut context = self.context.clone();
		context.insert("headers", &self.headers);
		templates.render("panels/headers.html", &context)
	}

	fn process_request(&mut self, request: &RequestInfo) {
		let mut headers: Vec<(String, String)> = HEADER_FILTER
			.iter()
			.filter_map(|name| {
				let value = request.headers.get(*name)?;
				Some((
					name.to_string(),
					String::from_utf8_lossy(value.as_bytes()).into_owned(),
				))
			})
			.collect();

		headers.push(("request-method".to_string(), request.method.to_string()));
		headers.push(("path".to_string(), request.path().to_string()));
		if let Some(query) = request.query() {
			headers.push(("query-string".to_string(), query.to_string()));
		}
		if let Some(addr) = request.remote_addr {
			headers.push(("remote-addr".to_string(), addr.ip().to_string()));
		}
		headers.push(("server-protocol".to_string(), format!("{:?}", request.version)));
		self.headers = headers;
	}
}
