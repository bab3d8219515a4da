//! Profiler panel
//!
//! Times the view and every `tracing` span entered while it runs. Span timing
//! needs [`CaptureLayer`](crate::CaptureLayer) in the host's subscriber; the
//! view time is measured regardless.

use super::{PROFILER_PANEL, Panel, PanelDescriptor, ViewHandler};
use crate::capture::{Recorder, SpanStats};
use crate::context::{RequestInfo, ResponseInfo};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use axum::body::Body;
use http::Request;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;
use tower::util::BoxCloneService;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(PROFILER_PANEL, "Profiler", |init| {
		let config = init.services.config();
		Ok(Box::new(ProfilerPanel {
			is_active: config.profiler_enabled,
			dump_filename: config.profiler_dump_filename.clone(),
			recorder: init.recorder.clone(),
			context: init.context.clone(),
			view_time: Arc::new(Mutex::new(None)),
			stats: Vec::new(),
		}) as Box<dyn Panel>)
	})
}

/// Per-span call counts and times for the request's view.
pub struct ProfilerPanel {
	is_active: bool,
	dump_filename: Option<PathBuf>,
	recorder: Recorder,
	context: tera::Context,
	view_time: Arc<Mutex<Option<Duration>>>,
	stats: Vec<SpanStats>,
}

impl ProfilerPanel {
	fn view_ms(&self) -> Option<f64> {
		self.view_time
			.lock()
			.map(|elapsed| elapsed.as_secs_f64() * 1000.0)
	}
}

fn span_report(stats: &[SpanStats], view_ms: f64) -> serde_json::Value {
	let spans: Vec<serde_json::Value> = stats
		.iter()
		.map(|span| {
			serde_json::json!({
				"name": span.name,
				"calls": span.calls,
				"total_ms": span.total.as_secs_f64() * 1000.0,
			})
		})
		.collect();
	serde_json::json!({ "view_ms": view_ms, "spans": spans })
}

async fn dump(path: &Path, report: serde_json::Value) {
	let written = match serde_json::to_vec_pretty(&report) {
		Ok(bytes) => tokio::fs::write(path, bytes).await,
		Err(err) => Err(std::io::Error::other(err)),
	};
	if let Err(err) = written {
		tracing::warn!(path = %path.display(), error = %err, "Failed to dump profiler results");
	}
}

impl Panel for ProfilerPanel {
	fn name(&self) -> &str {
		"Profiler"
	}

	fn nav_title(&self) -> String {
		"Profiler".to_string()
	}

	fn nav_subtitle(&self) -> String {
		if !self.is_active {
			return "in-active".to_string();
		}
		match self.view_ms() {
			Some(ms) => format!("View: {:.2}ms", ms),
			None => String::new(),
		}
	}

	fn title(&self) -> String {
		if !self.is_active {
			return "Profiler not active".to_string();
		}
		match self.view_ms() {
			Some(ms) => format!("View: {:.2}ms", ms),
			None => "Profiler".to_string(),
		}
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		if !self.is_active {
			return Ok("The profiler is not activated, activate it to use it".to_string());
		}

		let spans: Vec<serde_json::Value> = self
			.stats
			.iter()
			.map(|span| {
				let total_ms = span.total.as_secs_f64() * 1000.0;
				serde_json::json!({
					"name": span.name,
					"calls": span.calls,
					"total_ms": total_ms,
					"per_call_ms": total_ms / span.calls.max(1) as f64,
				})
			})
			.collect();

		let mut context = self.context.clone();
		context.insert("view_ms", &self.view_ms().unwrap_or(0.0));
		context.insert("spans", &spans);
		templates.render("panels/profiler.html", &context)
	}

	fn user_activate(&self) -> bool {
		true
	}

	fn is_active(&self) -> bool {
		self.is_active
	}

	fn activate(&mut self) {
		self.is_active = true;
	}

	fn process_request(&mut self, _request: &RequestInfo) {
		if self.is_active {
			self.recorder.set_profiling(true);
		}
	}

	fn process_view(&mut self, _request: &RequestInfo, view: ViewHandler) -> Option<ViewHandler> {
		if !self.is_active {
			return None;
		}

		let view_time = Arc::clone(&self.view_time);
		let recorder = self.recorder.clone();
		let dump_filename = self.dump_filename.clone();
		let timed = tower::service_fn(move |request: Request<Body>| {
			let view = view.clone();
			let view_time = Arc::clone(&view_time);
			let recorder = recorder.clone();
			let dump_filename = dump_filename.clone();
			async move {
				let started = Instant::now();
				let response = view.oneshot(request).await;
				let elapsed = started.elapsed();
				*view_time.lock() = Some(elapsed);
				if let Some(path) = dump_filename {
					let report = span_report(&recorder.span_stats(), elapsed.as_secs_f64() * 1000.0);
					dump(&path, report).await;
				}
				response
			}
		});
		Some(BoxCloneService::new(timed))
	}

	fn process_response(&mut self, _request: &RequestInfo, _response: &ResponseInfo) {
		if !self.is_active {
			return;
		}
		self.recorder.set_profiling(false);
		self.stats = self.recorder.span_stats();
	}
}
