//! Timer panel

use super::{Panel, PanelDescriptor, TIMER_PANEL};
use crate::context::{RequestInfo, ResponseInfo};
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(TIMER_PANEL, "Timer", |init| {
		Ok(Box::new(TimerPanel::new(init.context.clone())) as Box<dyn Panel>)
	})
}

/// Wall-clock time spent handling the request.
pub struct TimerPanel {
	context: tera::Context,
	started: Option<(Instant, DateTime<Utc>)>,
	total: Option<Duration>,
	status: Option<u16>,
}

impl TimerPanel {
	fn new(context: tera::Context) -> Self {
		Self {
			context,
			started: None,
			total: None,
			status: None,
		}
	}

	/// Elapsed milliseconds, measured up to now while the request runs.
	pub fn total_ms(&self) -> f64 {
		let elapsed = match (self.total, self.started) {
			(Some(total), _) => total,
			(None, Some((start, _))) => start.elapsed(),
			(None, None) => Duration::ZERO,
		};
		elapsed.as_secs_f64() * 1000.0
	}
}

impl Panel for TimerPanel {
	fn name(&self) -> &str {
		"Timer"
	}

	fn nav_title(&self) -> String {
		"Time".to_string()
	}

	fn nav_subtitle(&self) -> String {
		format!("TOTAL: {:.2}ms", self.total_ms())
	}

	fn title(&self) -> String {
		"Request Timing".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let mut rows = vec![("Elapsed time".to_string(), format!("{:.3} msec", self.total_ms()))];
		if let Some((_, at)) = self.started {
			rows.push(("Request started".to_string(), at.to_rfc3339()));
		}
		if let Some(status) = self.status {
			rows.push(("Response status".to_string(), status.to_string()));
		}

		let mut context = self.context.clone();
		context.insert("rows", &rows);
		templates.render("panels/timer.html", &context)
	}

	fn process_request(&mut self, request: &RequestInfo) {
		self.started = Some((Instant::now(), request.timestamp));
		self.total = None;
	}

	fn process_response(&mut self, _request: &RequestInfo, response: &ResponseInfo) {
		if let Some((start, _)) = self.started {
			self.total = Some(start.elapsed());
		}
		self.status = Some(response.status.as_u16());
	}
}
