//! Panel system
//!
//! A panel collects one kind of diagnostic data for a single request and
//! renders it into the toolbar. Panels are created per request from the
//! factories held by the [`PanelRegistry`], so their state never leaks across
//! requests.

pub mod config_vars;
pub mod headers;
pub mod logging;
pub mod profiler;
pub mod registry;
pub mod request_globals;
pub mod request_vars;
pub mod route_list;
pub mod sql;
pub mod template;
pub mod timer;
pub mod version;

pub use registry::{PanelDescriptor, PanelFactory, PanelRegistry, RouteRegistrar};

use crate::capture::Recorder;
use crate::context::{RequestInfo, ResponseInfo, ToolbarServices};
use crate::error::ToolbarResult;
use crate::store::RequestId;
use crate::ui::ToolbarTemplates;
use axum::body::Body;
use http::{Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tower::util::BoxCloneService;

/// The view a request is dispatched to, possibly wrapped by panels.
pub type ViewHandler = BoxCloneService<Request<Body>, Response<Body>, Infallible>;

/// Identifier of [`version::VersionPanel`]
pub const VERSION_PANEL: &str = "reinhardt_debug_toolbar::panels::VersionPanel";
/// Identifier of [`timer::TimerPanel`]
pub const TIMER_PANEL: &str = "reinhardt_debug_toolbar::panels::TimerPanel";
/// Identifier of [`headers::HeadersPanel`]
pub const HEADERS_PANEL: &str = "reinhardt_debug_toolbar::panels::HeadersPanel";
/// Identifier of [`request_vars::RequestVarsPanel`]
pub const REQUEST_VARS_PANEL: &str = "reinhardt_debug_toolbar::panels::RequestVarsPanel";
/// Identifier of [`config_vars::ConfigVarsPanel`]
pub const CONFIG_VARS_PANEL: &str = "reinhardt_debug_toolbar::panels::ConfigVarsPanel";
/// Identifier of [`template::TemplatePanel`]
pub const TEMPLATE_PANEL: &str = "reinhardt_debug_toolbar::panels::TemplatePanel";
/// Identifier of [`sql::SqlPanel`]
pub const SQL_PANEL: &str = "reinhardt_debug_toolbar::panels::SqlPanel";
/// Identifier of [`logging::LoggingPanel`]
pub const LOGGING_PANEL: &str = "reinhardt_debug_toolbar::panels::LoggingPanel";
/// Identifier of [`route_list::RouteListPanel`]
pub const ROUTE_LIST_PANEL: &str = "reinhardt_debug_toolbar::panels::RouteListPanel";
/// Identifier of [`profiler::ProfilerPanel`]
pub const PROFILER_PANEL: &str = "reinhardt_debug_toolbar::panels::ProfilerPanel";
/// Identifier of [`request_globals::RequestGlobalsPanel`]
pub const REQUEST_GLOBALS_PANEL: &str = "reinhardt_debug_toolbar::panels::RequestGlobalsPanel";

/// Built-in panels in their default display order.
pub const DEFAULT_PANELS: [&str; 11] = [
	VERSION_PANEL,
	TIMER_PANEL,
	HEADERS_PANEL,
	REQUEST_VARS_PANEL,
	CONFIG_VARS_PANEL,
	TEMPLATE_PANEL,
	SQL_PANEL,
	LOGGING_PANEL,
	ROUTE_LIST_PANEL,
	PROFILER_PANEL,
	REQUEST_GLOBALS_PANEL,
];

/// Everything a panel factory gets to build a per-request instance.
#[derive(Clone)]
pub struct PanelInit {
	/// Shared toolbar services
	pub services: Arc<ToolbarServices>,
	/// Capture sink of the request
	pub recorder: Recorder,
	/// Request the panel belongs to
	pub request_id: RequestId,
	/// Template context shared by the toolbar and all its panels
	pub context: tera::Context,
}

/// Debug panel
///
/// Only [`name`](Panel::name), [`nav_title`](Panel::nav_title) and
/// [`title`](Panel::title) are required; every lifecycle hook defaults to a
/// no-op.
pub trait Panel: Send {
	/// Display name, also the source of the DOM id
	fn name(&self) -> &str;

	/// DOM id of the panel, `flDebug<Name>Panel`
	fn dom_id(&self) -> String {
		format!("flDebug{}Panel", self.name().replace(' ', ""))
	}

	/// Title shown in the toolbar
	fn nav_title(&self) -> String;

	/// Subtitle shown under the toolbar title
	fn nav_subtitle(&self) -> String {
		String::new()
	}

	/// Title shown at the top of the opened panel
	fn title(&self) -> String;

	/// Whether the panel opens to show content
	fn has_content(&self) -> bool {
		false
	}

	/// Render the panel body
	fn content(&self, _templates: &ToolbarTemplates) -> ToolbarResult<String> {
		Ok(String::new())
	}

	/// Whether the user can switch the panel on and off
	fn user_activate(&self) -> bool {
		false
	}

	/// Whether the panel considers itself active regardless of the cookie
	fn is_active(&self) -> bool {
		false
	}

	/// Called when the activation cookie lists this panel
	fn activate(&mut self) {}

	/// Called before the request is dispatched
	fn process_request(&mut self, _request: &RequestInfo) {}

	/// Called with the view about to handle the request
	///
	/// Returning `Some` replaces the view for the rest of the chain.
	fn process_view(&mut self, _request: &RequestInfo, _view: ViewHandler) -> Option<ViewHandler> {
		None
	}

	/// Called once the response head is known
	fn process_response(&mut self, _request: &RequestInfo, _response: &ResponseInfo) {}
}
