//! Panel registry behaviour through the public API

use crate::common::fixtures::default_config;
use crate::common::mock_panel::MockPanel;
use reinhardt_debug_toolbar::panels::{DEFAULT_PANELS, SQL_PANEL, TIMER_PANEL};
use reinhardt_debug_toolbar::{
	PanelRegistry, Recorder, RequestId, ToolbarConfig, ToolbarServices, ToolbarSession,
};
use rstest::*;
use std::sync::Arc;

fn session(config: ToolbarConfig, registry: &PanelRegistry) -> ToolbarSession {
	let services = Arc::new(ToolbarServices::new(config).unwrap());
	ToolbarSession::create(
		RequestId::new(),
		&[],
		registry,
		services,
		Recorder::new(true),
	)
}

#[rstest]
fn test_unresolvable_identifier_is_skipped(default_config: ToolbarConfig) {
	let registry = PanelRegistry::with_builtin();
	let config = default_config.with_panels([TIMER_PANEL, "myapp::panels::Missing", SQL_PANEL]);

	let session = session(config, &registry);
	assert_eq!(session.identifiers(), vec![TIMER_PANEL, SQL_PANEL]);
	assert_eq!(session.dom_ids(), vec!["flDebugTimerPanel", "flDebugSQLPanel"]);
}

#[rstest]
fn test_default_panels_instantiate_without_capabilities(default_config: ToolbarConfig) {
	let registry = PanelRegistry::with_builtin();
	let session = session(default_config, &registry);
	assert_eq!(session.identifiers(), DEFAULT_PANELS.to_vec());
}

#[rstest]
fn test_custom_panel_registered(default_config: ToolbarConfig) {
	let mock = MockPanel::new("myapp::panels::MockPanel", "Mock");
	let mut registry = PanelRegistry::with_builtin();
	registry.register(mock.descriptor());

	let config = default_config.with_panels(["myapp::panels::MockPanel", TIMER_PANEL]);
	let session = session(config, &registry);
	assert_eq!(session.dom_ids(), vec!["flDebugMockPanel", "flDebugTimerPanel"]);
	assert_eq!(mock.counters().created(), 1);
}

#[rstest]
fn test_reregistering_replaces_cached_resolution(default_config: ToolbarConfig) {
	let mut registry = PanelRegistry::new();
	assert!(registry.resolve("late::Panel").is_none());

	registry.register(MockPanel::new("late::Panel", "Late").descriptor());
	assert!(registry.resolve("late::Panel").is_some());

	let session = session(default_config.with_panels(["late::Panel"]), &registry);
	assert_eq!(session.identifiers(), vec!["late::Panel"]);
}

#[rstest]
fn test_failing_factory_is_skipped(default_config: ToolbarConfig) {
	let mut registry = PanelRegistry::with_builtin();
	registry.register(MockPanel::new("broken::Panel", "Broken").with_init_failure().descriptor());

	let session = session(
		default_config.with_panels(["broken::Panel", TIMER_PANEL]),
		&registry,
	);
	assert_eq!(session.identifiers(), vec![TIMER_PANEL]);
}
