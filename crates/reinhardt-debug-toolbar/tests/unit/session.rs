//! Session construction, activation and rendering

use crate::common::fixtures::default_config;
use crate::common::mock_panel::MockPanel;
use http::HeaderMap;
use http::header::COOKIE;
use reinhardt_debug_toolbar::panels::{PROFILER_PANEL, TIMER_PANEL};
use reinhardt_debug_toolbar::session::parse_activation_cookie;
use reinhardt_debug_toolbar::{
	PanelRegistry, Recorder, RequestId, ToolbarConfig, ToolbarServices, ToolbarSession,
	ToolbarTemplates,
};
use rstest::*;
use std::sync::Arc;

fn cookie_headers(value: &str) -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(COOKIE, value.parse().unwrap());
	headers
}

fn create(config: ToolbarConfig, registry: &PanelRegistry, activated: &[String]) -> ToolbarSession {
	let services = Arc::new(ToolbarServices::new(config).unwrap());
	ToolbarSession::create(RequestId::new(), activated, registry, services, Recorder::new(true))
}

#[rstest]
#[case("fldt_active=flDebugProfilerPanel", vec!["flDebugProfilerPanel"])]
#[case("fldt_active=flDebugProfilerPanel%3BflDebugMockPanel", vec!["flDebugProfilerPanel", "flDebugMockPanel"])]
#[case("other=1; fldt_active=flDebugTimerPanel", vec!["flDebugTimerPanel"])]
#[case("fldt_active=", vec![])]
#[case("other=1", vec![])]
fn test_parse_activation_cookie(#[case] cookie: &str, #[case] expected: Vec<&str>) {
	assert_eq!(parse_activation_cookie(&cookie_headers(cookie)), expected);
}

#[rstest]
fn test_missing_cookie_header() {
	assert!(parse_activation_cookie(&HeaderMap::new()).is_empty());
}

#[rstest]
fn test_activation_from_cookie(default_config: ToolbarConfig) {
	let mock = MockPanel::new("tests::Switchable", "Switchable").with_user_activate();
	let mut registry = PanelRegistry::with_builtin();
	registry.register(mock.descriptor());
	let config = default_config.with_panels(["tests::Switchable", PROFILER_PANEL, TIMER_PANEL]);

	let activated = parse_activation_cookie(&cookie_headers(
		"fldt_active=flDebugSwitchablePanel%3BflDebugProfilerPanel",
	));
	let session = create(config, &registry, &activated);

	assert!(session.is_active("flDebugSwitchablePanel"));
	assert!(session.is_active("flDebugProfilerPanel"));
	assert!(!session.is_active("flDebugTimerPanel"));
	assert_eq!(mock.counters().activated(), 1);
}

#[rstest]
fn test_render_lists_every_panel(default_config: ToolbarConfig) {
	let registry = PanelRegistry::with_builtin();
	let session = create(default_config, &registry, &[]);
	let html = session.render(&ToolbarTemplates::new().unwrap()).unwrap();

	for dom_id in session.dom_ids() {
		assert!(html.contains(&format!("id=\"{}\"", dom_id)), "{dom_id} missing");
	}
	assert!(html.contains("flDebugToolbar"));
	assert!(html.contains("toolbar.js"));
}

#[rstest]
fn test_render_is_deterministic(default_config: ToolbarConfig) {
	let registry = PanelRegistry::with_builtin();
	let config = default_config.with_panels(["reinhardt_debug_toolbar::panels::VersionPanel"]);
	let session = create(config, &registry, &[]);
	let templates = ToolbarTemplates::new().unwrap();
	assert_eq!(session.render(&templates).unwrap(), session.render(&templates).unwrap());
}

#[rstest]
fn test_failing_content_is_escaped(default_config: ToolbarConfig) {
	let mock = MockPanel::new("tests::Failing", "Failing").with_content_failure();
	let mut registry = PanelRegistry::new();
	registry.register(mock.descriptor());
	let session = create(default_config.with_panels(["tests::Failing"]), &registry, &[]);

	let html = session.render(&ToolbarTemplates::new().unwrap()).unwrap();
	assert!(html.contains("flDebugError"));
	assert!(html.contains("&lt;content&gt;"));
	assert!(!html.contains("<content>"));
}
