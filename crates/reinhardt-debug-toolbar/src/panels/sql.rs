//! SQL query debugging panel

use super::{Panel, PanelDescriptor, PanelInit, SQL_PANEL};
use crate::capture::{RecordedQuery, Recorder};
use crate::context::ToolbarServices;
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use crate::utils::html::pluralize;
use crate::utils::sql_normalization::{detect_n_plus_one, normalize_sql, normalized_counts};
use crate::views::{VIEWS_PATH, sql::routes};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(SQL_PANEL, "SQL", |init| {
		Ok(Box::new(SqlPanel::new(init)) as Box<dyn Panel>)
	})
	.with_routes(|_| Ok(Some(routes())))
}

/// SQL query debugging panel
pub struct SqlPanel {
	/// SQL warning threshold in milliseconds
	warning_threshold_ms: u64,
	recorder: Recorder,
	services: Arc<ToolbarServices>,
	context: tera::Context,
}

impl SqlPanel {
	/// Create the panel for one request.
	pub fn new(init: &PanelInit) -> Self {
		Self {
			warning_threshold_ms: init.services.config().sql_warning_threshold_ms,
			recorder: init.recorder.clone(),
			services: Arc::clone(&init.services),
			context: init.context.clone(),
		}
	}

	/// Create the panel with a custom warning threshold
	pub fn with_threshold(init: &PanelInit, warning_threshold_ms: u64) -> Self {
		Self {
			warning_threshold_ms,
			..Self::new(init)
		}
	}

	/// Whether queries can be recorded and replayed.
	pub fn is_available(&self) -> bool {
		self.recorder.records_queries() && self.services.executor().is_some()
	}

	fn is_slow(&self, duration: Duration) -> bool {
		duration.as_millis() as u64 >= self.warning_threshold_ms
	}

	fn query_rows(&self, queries: &[RecordedQuery]) -> (Vec<serde_json::Value>, Vec<String>) {
		let counts = normalized_counts(queries);
		let n_plus_one_patterns = detect_n_plus_one(queries);
		let replayable = self.services.executor().is_some();

		let rows: Vec<serde_json::Value> = queries
			.iter()
			.enumerate()
			.map(|(idx, q)| {
				let normalized = normalize_sql(&q.sql);
				let signed_query = if replayable {
					self.services.signer().sign(&q.sql, &q.params)
				} else {
					None
				};
				let params = match &q.params {
					serde_json::Value::Null => None,
					other => Some(other.to_string()),
				};
				serde_json::json!({
					"index": idx,
					"sql": q.sql,
					"params": params,
					"duration_ms": q.duration.as_secs_f64() * 1000.0,
					"signed_query": signed_query,
					"location": q.location,
					"is_duplicate": counts[&normalized] > 1,
					"is_slow": self.is_slow(q.duration),
					"is_n_plus_one": n_plus_one_patterns.contains(&normalized),
				})
			})
			.collect();

		let duplicate_count = counts.values().filter(|&&count| count > 1).count();
		let slow_count = queries.iter().filter(|q| self.is_slow(q.duration)).count();

		let mut warnings = Vec::new();
		if duplicate_count > 0 {
			warnings.push(format!("{} duplicate queries detected", duplicate_count));
		}
		if slow_count > 0 {
			warnings.push(format!(
				"{} slow queries (>{}ms)",
				slow_count, self.warning_threshold_ms
			));
		}
		if !n_plus_one_patterns.is_empty() {
			warnings.push(format!(
				"{} potential N+1 query patterns detected",
				n_plus_one_patterns.len()
			));
		}

		(rows, warnings)
	}
}

impl Panel for SqlPanel {
	fn name(&self) -> &str {
		"SQL"
	}

	fn nav_title(&self) -> String {
		"SQL".to_string()
	}

	fn nav_subtitle(&self) -> String {
		let queries = self.recorder.queries();
		if queries.is_empty() && !self.is_available() {
			return "Unavailable".to_string();
		}
		pluralize(queries.len(), "query", "queries")
	}

	fn title(&self) -> String {
		"SQL queries".to_string()
	}

	fn has_content(&self) -> bool {
		!self.recorder.queries().is_empty() || !self.is_available()
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let queries = self.recorder.queries();
		let mut context = self.context.clone();

		if queries.is_empty() && !self.is_available() {
			context.insert("recording_enabled", &self.recorder.records_queries());
			context.insert("executor_registered", &self.services.executor().is_some());
			return templates.render("panels/sql_unavailable.html", &context);
		}

		let (rows, warnings) = self.query_rows(&queries);
		context.insert("queries", &rows);
		context.insert("warnings", &warnings);
		context.insert("views_path", VIEWS_PATH);
		templates.render("panels/sql.html", &context)
	}
}
