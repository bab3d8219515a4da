//! Logging panel

use super::{LOGGING_PANEL, Panel, PanelDescriptor};
use crate::capture::Recorder;
use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use crate::utils::html::pluralize;

pub(crate) fn descriptor() -> PanelDescriptor {
	PanelDescriptor::new(LOGGING_PANEL, "Logging", |init| {
		Ok(Box::new(LoggingPanel {
			recorder: init.recorder.clone(),
			context: init.context.clone(),
		}) as Box<dyn Panel>)
	})
}

/// `tracing` events emitted while handling the request.
///
/// Events reach the panel through [`CaptureLayer`](crate::CaptureLayer).
pub struct LoggingPanel {
	recorder: Recorder,
	context: tera::Context,
}

impl Panel for LoggingPanel {
	fn name(&self) -> &str {
		"Logging"
	}

	fn nav_title(&self) -> String {
		"Logging".to_string()
	}

	fn nav_subtitle(&self) -> String {
		pluralize(self.recorder.logs().len(), "message", "messages")
	}

	fn title(&self) -> String {
		"Log Messages".to_string()
	}

	fn has_content(&self) -> bool {
		true
	}

	fn content(&self, templates: &ToolbarTemplates) -> ToolbarResult<String> {
		let records: Vec<serde_json::Value> = self
			.recorder
			.logs()
			.into_iter()
			.map(|record| {
				serde_json::json!({
					"level": record.level,
					"time": record.time.format("%H:%M:%S%.3f").to_string(),
					"target": record.target,
					"message": record.message,
					"file": record.file,
					"line": record.line,
				})
			})
			.collect();
		let mut context = self.context.clone();
		context.insert("records", &records);
		templates.render("panels/logger.html", &context)
	}
}
