//! Toolbar services and per-request information
//!
//! [`ToolbarServices`] is built once when the layer is constructed and shared
//! by every session, panel and toolbar view. [`RequestInfo`] and
//! [`ResponseInfo`] are snapshots handed to panel lifecycle hooks.

use crate::error::ToolbarResult;
use crate::middleware::ToolbarConfig;
use crate::signing::QuerySigner;
use crate::store::RequestId;
use crate::ui::ToolbarTemplates;
use crate::views::template::TemplateEditorCache;
use async_trait::async_trait;
use axum::extract::{ConnectInfo, MatchedPath};
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// Description of one route of the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
	/// Route pattern, e.g. `/users/{id}`
	pub path: String,
	/// Allowed methods
	pub methods: Vec<String>,
	/// Handler name shown in the route list
	pub endpoint: String,
}

impl RouteInfo {
	/// Create a route description.
	pub fn new(path: impl Into<String>, methods: &[&str], endpoint: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			methods: methods.iter().map(|m| m.to_string()).collect(),
			endpoint: endpoint.into(),
		}
	}
}

/// Rows returned by a replayed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
	/// Column names
	pub columns: Vec<String>,
	/// Result rows, one value per column
	pub rows: Vec<Vec<Value>>,
}

/// Database access used by the select/explain views.
///
/// The host registers one executor through
/// [`DebugToolbarBuilder::with_executor`](crate::DebugToolbarBuilder::with_executor).
/// Without it the SQL panel still lists recorded queries but offers no replay.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
	/// Database dialect name, e.g. `sqlite` or `postgres`.
	fn dialect(&self) -> &str;

	/// Execute a read-only statement with its bound parameters.
	async fn execute(&self, statement: &str, params: &Value) -> ToolbarResult<QueryOutput>;
}

/// State shared by every session and toolbar view.
pub struct ToolbarServices {
	pub(crate) config: ToolbarConfig,
	pub(crate) signer: QuerySigner,
	pub(crate) executor: Option<Arc<dyn QueryExecutor>>,
	pub(crate) templates: ToolbarTemplates,
	pub(crate) editor: TemplateEditorCache,
	pub(crate) routes: Vec<RouteInfo>,
	pub(crate) app_config: BTreeMap<String, Value>,
	pub(crate) packages: Vec<(String, String)>,
}

impl ToolbarServices {
	/// Build services from a validated configuration.
	pub fn new(config: ToolbarConfig) -> ToolbarResult<Self> {
		let signer = QuerySigner::new(&config.secret_key);
		Ok(Self {
			config,
			signer,
			executor: None,
			templates: ToolbarTemplates::new()?,
			editor: TemplateEditorCache::default(),
			routes: Vec::new(),
			app_config: BTreeMap::new(),
			packages: Vec::new(),
		})
	}

	/// Toolbar configuration
	pub fn config(&self) -> &ToolbarConfig {
		&self.config
	}

	/// Signer for replayable query tokens
	pub fn signer(&self) -> &QuerySigner {
		&self.signer
	}

	/// Host query executor, if one was registered
	pub fn executor(&self) -> Option<&Arc<dyn QueryExecutor>> {
		self.executor.as_ref()
	}

	/// Embedded templates
	pub fn templates(&self) -> &ToolbarTemplates {
		&self.templates
	}

	/// Template editor cache
	pub fn editor(&self) -> &TemplateEditorCache {
		&self.editor
	}

	/// Routes declared by the host application
	pub fn routes(&self) -> &[RouteInfo] {
		&self.routes
	}

	/// Host configuration values shown by the config panel
	pub fn app_config(&self) -> &BTreeMap<String, Value> {
		&self.app_config
	}

	/// Host package versions shown by the version panel
	pub fn packages(&self) -> &[(String, String)] {
		&self.packages
	}
}

impl std::fmt::Debug for ToolbarServices {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToolbarServices")
			.field("config", &self.config)
			.field("has_executor", &self.executor.is_some())
			.field("routes", &self.routes.len())
			.finish_non_exhaustive()
	}
}

/// Snapshot of the inbound request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
	/// Identifier of the request's session
	pub request_id: RequestId,
	/// HTTP method
	pub method: Method,
	/// Request URI
	pub uri: Uri,
	/// Protocol version
	pub version: Version,
	/// Request headers
	pub headers: HeaderMap,
	/// Peer address when the server provides `ConnectInfo`
	pub remote_addr: Option<SocketAddr>,
	/// Matched route pattern when known
	pub matched_path: Option<String>,
	/// Time the request entered the toolbar
	pub timestamp: DateTime<Utc>,
}

impl RequestInfo {
	/// Capture request facts from its head.
	pub fn from_parts(parts: &http::request::Parts, request_id: RequestId) -> Self {
		Self {
			request_id,
			method: parts.method.clone(),
			uri: parts.uri.clone(),
			version: parts.version,
			headers: parts.headers.clone(),
			remote_addr: parts
				.extensions
				.get::<ConnectInfo<SocketAddr>>()
				.map(|info| info.0),
			matched_path: parts
				.extensions
				.get::<MatchedPath>()
				.map(|path| path.as_str().to_string()),
			timestamp: Utc::now(),
		}
	}

	/// Request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string
	pub fn query(&self) -> Option<&str> {
		self.uri.query()
	}

	/// Decoded query arguments, in order of appearance.
	pub fn query_args(&self) -> Vec<(String, String)> {
		self.query().map(parse_pairs).unwrap_or_default()
	}

	/// Cookies sent with the request.
	pub fn cookies(&self) -> Vec<(String, String)> {
		self.headers
			.get_all(http::header::COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.filter_map(|pair| {
				let (name, value) = pair.trim().split_once('=')?;
				Some((name.trim().to_string(), value.trim().to_string()))
			})
			.collect()
	}

	/// Value of a single cookie.
	pub fn cookie(&self, name: &str) -> Option<String> {
		self.cookies()
			.into_iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value)
	}
}

/// Split and percent-decode an `a=1&b=2` string.
pub(crate) fn parse_pairs(raw: &str) -> Vec<(String, String)> {
	raw.split('&')
		.filter(|pair| !pair.is_empty())
		.map(|pair| {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
			(decode_component(key), decode_component(value))
		})
		.collect()
}

fn decode_component(raw: &str) -> String {
	let raw = raw.replace('+', " ");
	urlencoding::decode(&raw)
		.map(|decoded| decoded.into_owned())
		.unwrap_or(raw)
}

/// Snapshot of the outbound response head.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
	/// Response status
	pub status: StatusCode,
	/// Response headers
	pub headers: HeaderMap,
}

impl ResponseInfo {
	/// Capture the head of a response.
	pub fn from_parts(parts: &http::response::Parts) -> Self {
		Self {
			status: parts.status,
			headers: parts.headers.clone(),
		}
	}
}
