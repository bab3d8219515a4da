//! Static toolbar assets

const TOOLBAR_CSS: &str = include_str!("../../static/toolbar.css");
const TOOLBAR_JS: &str = include_str!("../../static/toolbar.js");

/// An embedded static file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
	/// `Content-Type` to serve it with
	pub content_type: &'static str,
	/// File contents
	pub body: &'static str,
}

/// Look up an asset by its path below the static prefix.
pub fn lookup(path: &str) -> Option<Asset> {
	match path.trim_start_matches('/') {
		"toolbar.css" | "css/toolbar.css" => Some(Asset {
			content_type: "text/css; charset=utf-8",
			body: TOOLBAR_CSS,
		}),
		"toolbar.js" | "js/toolbar.js" => Some(Asset {
			content_type: "application/javascript; charset=utf-8",
			body: TOOLBAR_JS,
		}),
		_ => None,
	}
}
