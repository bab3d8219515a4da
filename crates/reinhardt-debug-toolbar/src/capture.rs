//! Per-request capture of queries, templates, log events and span timings
//!
//! Every request that gets a toolbar session also gets a [`Recorder`]. The
//! middleware inserts it into the request extensions (handlers extract it
//! like any other axum extractor) and installs it as the task-local capture
//! scope while the host service runs. [`CaptureLayer`] routes `tracing`
//! events into whichever recorder is in scope; outside a request it does
//! nothing.

use axum::extract::FromRequestParts;
use chrono::{DateTime, Utc};
use http::request::Parts;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fmt::Write as _;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

tokio::task_local! {
	static CURRENT_RECORDER: Recorder;
}

/// A query executed while handling a request.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedQuery {
	/// Statement text
	pub sql: String,
	/// Bound parameters
	pub params: Value,
	/// Execution time
	pub duration: Duration,
	/// Source location that recorded the query
	pub location: Option<String>,
	/// When the query was recorded
	pub timestamp: DateTime<Utc>,
}

impl RecordedQuery {
	/// Create a query record without a source location.
	pub fn new(sql: impl Into<String>, params: Value, duration: Duration) -> Self {
		Self {
			sql: sql.into(),
			params,
			duration,
			location: None,
			timestamp: Utc::now(),
		}
	}
}

/// A template rendered while handling a request.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedTemplate {
	/// Template name
	pub name: String,
	/// Context the template was rendered with
	pub context: Value,
	/// Source file, needed by the template editor
	pub path: Option<PathBuf>,
}

/// A `tracing` event emitted while handling a request.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
	/// Level name (`ERROR`, `WARN`, ...)
	pub level: String,
	/// Event target
	pub target: String,
	/// Formatted message including extra fields
	pub message: String,
	/// Source file
	pub file: Option<String>,
	/// Source line
	pub line: Option<u32>,
	/// Time of the event
	pub time: DateTime<Utc>,
}

/// Aggregated timings for spans sharing a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanStats {
	/// Span name
	pub name: String,
	/// Completed spans
	pub calls: u64,
	/// Time spent inside the spans
	pub total: Duration,
}

#[derive(Debug, Default)]
struct RecorderInner {
	record_queries: bool,
	profiling: AtomicBool,
	queries: Mutex<Vec<RecordedQuery>>,
	templates: Mutex<Vec<RenderedTemplate>>,
	logs: Mutex<Vec<LogRecord>>,
	spans: Mutex<HashMap<String, SpanStats>>,
	globals: Mutex<BTreeMap<String, Value>>,
}

/// Capture sink for one request.
///
/// Cloning is cheap. A recorder obtained outside a toolbar session is
/// disabled and silently drops everything.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
	inner: Option<Arc<RecorderInner>>,
}

impl Recorder {
	/// Create an active recorder.
	pub fn new(record_queries: bool) -> Self {
		Self {
			inner: Some(Arc::new(RecorderInner {
				record_queries,
				..Default::default()
			})),
		}
	}

	/// A recorder that records nothing.
	pub fn disabled() -> Self {
		Self::default()
	}

	/// Recorder of the request being handled by the current task.
	pub fn current() -> Option<Recorder> {
		CURRENT_RECORDER.try_with(|recorder| recorder.clone()).ok()
	}

	/// Run `future` with this recorder as the task's capture scope.
	pub async fn scope<F: Future>(self, future: F) -> F::Output {
		CURRENT_RECORDER.scope(self, future).await
	}

	/// Whether this recorder belongs to a toolbar session.
	pub fn is_enabled(&self) -> bool {
		self.inner.is_some()
	}

	/// Whether query recording is switched on.
	pub fn records_queries(&self) -> bool {
		self.inner
			.as_ref()
			.is_some_and(|inner| inner.record_queries)
	}

	/// Record an executed query.
	#[track_caller]
	pub fn record_query(&self, sql: impl Into<String>, params: Value, duration: Duration) {
		let Some(inner) = self.inner.as_ref().filter(|inner| inner.record_queries) else {
			return;
		};
		let caller = std::panic::Location::caller();
		let mut query = RecordedQuery::new(sql, params, duration);
		query.location = Some(format!("{}:{}", caller.file(), caller.line()));
		inner.queries.lock().push(query);
	}

	/// Record a rendered template.
	pub fn record_template(&self, name: impl Into<String>, context: Value, path: Option<PathBuf>) {
		if let Some(inner) = &self.inner {
			inner.templates.lock().push(RenderedTemplate {
				name: name.into(),
				context,
				path,
			});
		}
	}

	pub(crate) fn record_log(&self, record: LogRecord) {
		if let Some(inner) = &self.inner {
			inner.logs.lock().push(record);
		}
	}

	/// Store a request-scoped value shown by the request globals panel.
	///
	/// Setting a key again replaces its value.
	pub fn set_global(&self, key: impl Into<String>, value: impl Into<Value>) {
		if let Some(inner) = &self.inner {
			inner.globals.lock().insert(key.into(), value.into());
		}
	}

	/// Request-scoped values, sorted by key.
	pub fn globals(&self) -> BTreeMap<String, Value> {
		self.inner
			.as_ref()
			.map(|inner| inner.globals.lock().clone())
			.unwrap_or_default()
	}

	/// Recorded queries, in execution order.
	pub fn queries(&self) -> Vec<RecordedQuery> {
		self.inner
			.as_ref()
			.map(|inner| inner.queries.lock().clone())
			.unwrap_or_default()
	}

	/// Rendered templates, in render order.
	pub fn templates(&self) -> Vec<RenderedTemplate> {
		self.inner
			.as_ref()
			.map(|inner| inner.templates.lock().clone())
			.unwrap_or_default()
	}

	/// Captured log records, in emission order.
	pub fn logs(&self) -> Vec<LogRecord> {
		self.inner
			.as_ref()
			.map(|inner| inner.logs.lock().clone())
			.unwrap_or_default()
	}

	/// Remove and return the captured log records.
	pub fn take_logs(&self) -> Vec<LogRecord> {
		self.inner
			.as_ref()
			.map(|inner| std::mem::take(&mut *inner.logs.lock()))
			.unwrap_or_default()
	}

	/// Turn span timing capture on or off.
	pub fn set_profiling(&self, enabled: bool) {
		if let Some(inner) = &self.inner {
			inner.profiling.store(enabled, Ordering::Relaxed);
		}
	}

	/// Whether span timing capture is on.
	pub fn is_profiling(&self) -> bool {
		self.inner
			.as_ref()
			.is_some_and(|inner| inner.profiling.load(Ordering::Relaxed))
	}

	fn record_span(&self, name: &str, busy: Duration) {
		if let Some(inner) = &self.inner {
			let mut spans = inner.spans.lock();
			let stats = spans.entry(name.to_string()).or_insert_with(|| SpanStats {
				name: name.to_string(),
				..Default::default()
			});
			stats.calls += 1;
			stats.total += busy;
		}
	}

	/// Span timings, slowest first.
	pub fn span_stats(&self) -> Vec<SpanStats> {
		let mut stats: Vec<SpanStats> = self
			.inner
			.as_ref()
			.map(|inner| inner.spans.lock().values().cloned().collect())
			.unwrap_or_default();
		stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
		stats
	}
}

impl<S> FromRequestParts<S> for Recorder
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(parts.extensions.get::<Recorder>().cloned().unwrap_or_default())
	}
}

/// `tracing_subscriber` layer feeding the current request's [`Recorder`].
///
/// ```rust,ignore
/// use tracing_subscriber::prelude::*;
///
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer())
///     .with(reinhardt_debug_toolbar::CaptureLayer::new())
///     .init();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CaptureLayer {
	_private: (),
}

impl CaptureLayer {
	/// Create the layer.
	pub fn new() -> Self {
		Self::default()
	}
}

struct SpanTiming {
	recorder: Recorder,
	entered: Option<Instant>,
	busy: Duration,
}

#[derive(Default)]
struct MessageVisitor {
	message: String,
	fields: String,
}

impl Visit for MessageVisitor {
	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message.push_str(value);
		} else {
			let _ = write!(self.fields, " {}={}", field.name(), value);
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
		if field.name() == "message" {
			let _ = write!(self.message, "{:?}", value);
		} else {
			let _ = write!(self.fields, " {}={:?}", field.name(), value);
		}
	}
}

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let Some(recorder) = Recorder::current() else {
			return;
		};
		let metadata = event.metadata();
		if metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
			return;
		}

		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);

		recorder.record_log(LogRecord {
			level: metadata.level().to_string(),
			target: metadata.target().to_string(),
			message: format!("{}{}", visitor.message, visitor.fields),
			file: metadata.file().map(str::to_string),
			line: metadata.line(),
			time: Utc::now(),
		});
	}

	fn on_new_span(&self, _attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
		let Some(recorder) = Recorder::current().filter(Recorder::is_profiling) else {
			return;
		};
		if let Some(span) = ctx.span(id) {
			span.extensions_mut().insert(SpanTiming {
				recorder,
				entered: None,
				busy: Duration::ZERO,
			});
		}
	}

	fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
		if let Some(span) = ctx.span(id) {
			let mut extensions = span.extensions_mut();
			if let Some(timing) = extensions.get_mut::<SpanTiming>() {
				timing.entered = Some(Instant::now());
			}
		}
	}

	fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
		if let Some(span) = ctx.span(id) {
			let mut extensions = span.extensions_mut();
			if let Some(timing) = extensions.get_mut::<SpanTiming>()
				&& let Some(entered) = timing.entered.take()
			{
				timing.busy += entered.elapsed();
			}
		}
	}

	fn on_close(&self, id: Id, ctx: Context<'_, S>) {
		let Some(span) = ctx.span(&id) else {
			return;
		};
		let timing = span.extensions_mut().remove::<SpanTiming>();
		if let Some(timing) = timing {
			timing.recorder.record_span(span.name(), timing.busy);
		}
	}
}
