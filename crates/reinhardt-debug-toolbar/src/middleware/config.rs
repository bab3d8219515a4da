//! Toolbar configuration

use crate::error::{ToolbarError, ToolbarResult};
use crate::panels::DEFAULT_PANELS;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Debug toolbar configuration
///
/// Every field has a default, so a configuration can be deserialized from a
/// partial document:
///
/// ```
/// use reinhardt_debug_toolbar::ToolbarConfig;
///
/// let config: ToolbarConfig = serde_json::from_str(
///     r#"{"enabled": true, "secret_key": "s3cret", "hosts": ["127.0.0.1"]}"#,
/// ).unwrap();
/// assert!(config.validate().is_ok());
/// assert!(config.intercept_redirects);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
	/// Whether the toolbar runs at all (default: debug builds only)
	pub enabled: bool,

	/// Client addresses allowed to see the toolbar; empty allows everyone
	pub hosts: Vec<IpAddr>,

	/// Replace redirects with a page linking to the target
	pub intercept_redirects: bool,

	/// Panel identifiers in display order
	pub panels: Vec<String>,

	/// Host the toolbar routes are served on, when the app routes by host
	pub routes_host: Option<String>,

	/// Whether the host application routes by `Host` header
	pub host_matching: bool,

	/// Key for signing replayable query tokens
	#[serde(deserialize_with = "secret_from_str")]
	pub secret_key: Vec<u8>,

	/// Allow viewing, previewing and saving rendered templates
	pub template_editor_enabled: bool,

	/// Profile every request instead of only when the panel is switched on
	pub profiler_enabled: bool,

	/// Write profiler results as JSON to this file
	pub profiler_dump_filename: Option<PathBuf>,

	/// Queries slower than this are flagged (milliseconds)
	pub sql_warning_threshold_ms: u64,

	/// Record queries reported through the request recorder
	pub record_queries: bool,
}

fn secret_from_str<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	String::deserialize(deserializer).map(String::into_bytes)
}

impl Default for ToolbarConfig {
	fn default() -> Self {
		let enabled = cfg!(debug_assertions);
		Self {
			enabled,
			hosts: Vec::new(),
			intercept_redirects: true,
			panels: DEFAULT_PANELS.iter().map(|id| id.to_string()).collect(),
			routes_host: None,
			host_matching: false,
			secret_key: Vec::new(),
			template_editor_enabled: false,
			profiler_enabled: false,
			profiler_dump_filename: None,
			sql_warning_threshold_ms: 100,
			record_queries: enabled,
		}
	}
}

impl ToolbarConfig {
	/// Enabled configuration with the given secret.
	pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
		Self::default().enabled(true).with_secret_key(secret_key)
	}

	/// Switch the toolbar (and query recording) on or off.
	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self.record_queries = enabled;
		self
	}

	/// Set the signing secret.
	pub fn with_secret_key(mut self, secret_key: impl AsRef<[u8]>) -> Self {
		self.secret_key = secret_key.as_ref().to_vec();
		self
	}

	/// Restrict the toolbar to these client addresses.
	pub fn with_hosts(mut self, hosts: impl IntoIterator<Item = IpAddr>) -> Self {
		self.hosts = hosts.into_iter().collect();
		self
	}

	/// Replace the panel list.
	pub fn with_panels<I, S>(mut self, panels: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.panels = panels.into_iter().map(Into::into).collect();
		self
	}

	/// Toggle redirect interception.
	pub fn with_intercept_redirects(mut self, intercept: bool) -> Self {
		self.intercept_redirects = intercept;
		self
	}

	/// Serve toolbar routes only for this host.
	pub fn with_routes_host(mut self, host: impl Into<String>) -> Self {
		self.routes_host = Some(host.into());
		self
	}

	/// Declare that the host application routes by `Host` header.
	pub fn with_host_matching(mut self, host_matching: bool) -> Self {
		self.host_matching = host_matching;
		self
	}

	/// Toggle the template editor.
	pub fn with_template_editor(mut self, enabled: bool) -> Self {
		self.template_editor_enabled = enabled;
		self
	}

	/// Profile every request.
	pub fn with_profiler(mut self, enabled: bool) -> Self {
		self.profiler_enabled = enabled;
		self
	}

	/// Dump profiler results to a file.
	pub fn with_profiler_dump(mut self, path: impl Into<PathBuf>) -> Self {
		self.profiler_dump_filename = Some(path.into());
		self
	}

	/// Set the slow query threshold.
	pub fn with_sql_warning_threshold_ms(mut self, threshold: u64) -> Self {
		self.sql_warning_threshold_ms = threshold;
		self
	}

	/// Toggle query recording.
	pub fn with_record_queries(mut self, record: bool) -> Self {
		self.record_queries = record;
		self
	}

	/// Check the invariants the toolbar relies on.
	pub fn validate(&self) -> ToolbarResult<()> {
		if !self.enabled {
			return Ok(());
		}
		if self.secret_key.is_empty() {
			return Err(ToolbarError::MissingSecretKey);
		}
		if self.host_matching && self.routes_host.is_none() {
			return Err(ToolbarError::InvalidHostMatching);
		}
		Ok(())
	}

	/// Whether `addr` may see the toolbar.
	pub fn allows(&self, addr: Option<IpAddr>) -> bool {
		if self.hosts.is_empty() {
			return true;
		}
		addr.is_some_and(|addr| self.hosts.contains(&addr))
	}

	/// Configuration values for display, with the secret redacted.
	pub fn display_values(&self) -> BTreeMap<String, Value> {
		let mut values = BTreeMap::new();
		values.insert("enabled".into(), json!(self.enabled));
		values.insert(
			"hosts".into(),
			json!(self.hosts.iter().map(ToString::to_string).collect::<Vec<_>>()),
		);
		values.insert("intercept_redirects".into(), json!(self.intercept_redirects));
		values.insert("panels".into(), json!(self.panels));
		values.insert("routes_host".into(), json!(self.routes_host));
		values.insert("host_matching".into(), json!(self.host_matching));
		values.insert("secret_key".into(), json!("********"));
		values.insert(
			"template_editor_enabled".into(),
			json!(self.template_editor_enabled),
		);
		values.insert("profiler_enabled".into(), json!(self.profiler_enabled));
		values.insert(
			"profiler_dump_filename".into(),
			json!(
				self.profiler_dump_filename
					.as_ref()
					.map(|p| p.display().to_string())
			),
		);
		values.insert(
			"sql_warning_threshold_ms".into(),
			json!(self.sql_warning_threshold_ms),
		);
		values.insert("record_queries".into(), json!(self.record_queries));
		values
	}
}

impl std::fmt::Debug for ToolbarConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToolbarConfig")
			.field("enabled", &self.enabled)
			.field("hosts", &self.hosts)
			.field("intercept_redirects", &self.intercept_redirects)
			.field("panels", &self.panels)
			.field("routes_host", &self.routes_host)
			.field("host_matching", &self.host_matching)
			.field("secret_key", &"********")
			.field("template_editor_enabled", &self.template_editor_enabled)
			.field("profiler_enabled", &self.profiler_enabled)
			.field("profiler_dump_filename", &self.profiler_dump_filename)
			.field("sql_warning_threshold_ms", &self.sql_warning_threshold_ms)
			.field("record_queries", &self.record_queries)
			.finish()
	}
}
