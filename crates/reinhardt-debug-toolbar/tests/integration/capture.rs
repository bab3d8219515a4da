//! Data captured by the built-in panels during real requests

use crate::common::fixtures::*;
use axum::Router;
use axum::response::Html;
use axum::routing::get as get_route;
use reinhardt_debug_toolbar::panels::{
	LOGGING_PANEL, PROFILER_PANEL, REQUEST_GLOBALS_PANEL, REQUEST_VARS_PANEL, ROUTE_LIST_PANEL,
	SQL_PANEL, TIMER_PANEL,
};
use reinhardt_debug_toolbar::{CaptureLayer, DebugToolbarLayer, RouteInfo, ToolbarConfig};
use rstest::*;
use tower::ServiceExt;
use tracing_subscriber::prelude::*;

#[rstest]
#[tokio::test]
async fn test_logging_panel_collects_request_events(default_config: ToolbarConfig) {
	let subscriber = tracing_subscriber::registry().with(CaptureLayer::new());
	let _guard = tracing::subscriber::set_default(subscriber);

	let config = default_config.with_panels([LOGGING_PANEL]);
	let body = send(toolbar_app(config), get("/logs")).await.text();
	assert!(body.contains("2 messages"));
	assert!(body.contains("handling the logs page"));
	assert!(body.contains("user=alice"));
}

#[rstest]
#[tokio::test]
async fn test_logging_panel_without_capture_layer(default_config: ToolbarConfig) {
	let config = default_config.with_panels([LOGGING_PANEL]);
	let body = send(toolbar_app(config), get("/logs")).await.text();
	assert!(body.contains("0 messages"));
	assert!(body.contains("No messages logged."));
}

#[rstest]
#[tokio::test]
async fn test_events_outside_requests_are_dropped(default_config: ToolbarConfig) {
	let subscriber = tracing_subscriber::registry().with(CaptureLayer::new());
	let _guard = tracing::subscriber::set_default(subscriber);
	tracing::info!(target: "app", "before any request");

	let config = default_config.with_panels([LOGGING_PANEL]);
	let body = send(toolbar_app(config), get("/")).await.text();
	assert!(body.contains("0 messages"));
}

#[rstest]
#[tokio::test]
async fn test_sql_panel_shows_recorded_queries(default_config: ToolbarConfig) {
	let config = default_config.with_panels([SQL_PANEL]);
	let body = send(toolbar_app(config), get("/queries")).await.text();
	assert!(body.contains("3 queries"));
	assert!(body.contains("DUPLICATE"));
	assert!(body.contains("duplicate queries detected"));
}

#[rstest]
#[tokio::test]
async fn test_sql_panel_unavailable_when_recording_off(default_config: ToolbarConfig) {
	let config = default_config
		.with_panels([SQL_PANEL])
		.with_record_queries(false);
	let body = send(toolbar_app(config), get("/queries")).await.text();
	assert!(body.contains("Unavailable"));
	assert!(body.contains("Query recording is disabled"));
}

#[rstest]
#[tokio::test]
async fn test_profiler_activated_by_cookie(default_config: ToolbarConfig) {
	let subscriber = tracing_subscriber::registry().with(CaptureLayer::new());
	let _guard = tracing::subscriber::set_default(subscriber);
	let config = default_config.with_panels([PROFILER_PANEL]);

	let inactive = send(toolbar_app(config.clone()), get("/spans")).await.text();
	assert!(inactive.contains("in-active"));

	let active = send(
		toolbar_app(config),
		get_with_cookie("/spans", "fldt_active=flDebugProfilerPanel"),
	)
	.await
	.text();
	assert!(active.contains("View: "));
	assert!(active.contains("load_users"));
	assert!(active.contains("checked"));
}

#[rstest]
#[tokio::test]
async fn test_request_globals_are_per_request(default_config: ToolbarConfig) {
	let layer = DebugToolbarLayer::new(default_config.with_panels([REQUEST_GLOBALS_PANEL])).unwrap();

	let with_globals = send(wrap(&layer), get("/globals")).await.text();
	assert!(with_globals.contains("flDebugRequestGlobalsPanel"));
	assert!(with_globals.contains("2 values"));
	assert!(with_globals.contains("current_user"));
	assert!(with_globals.contains("alice"));

	let without = send(wrap(&layer), get("/")).await.text();
	assert!(without.contains("0 values"));
	assert!(!without.contains("current_user"));
}

#[rstest]
#[tokio::test]
async fn test_timer_and_route_list(default_config: ToolbarConfig) {
	let layer = DebugToolbarLayer::builder(default_config.with_panels([TIMER_PANEL, ROUTE_LIST_PANEL]))
		.with_routes([
			RouteInfo::new("/", &["GET"], "index"),
			RouteInfo::new("/users/{id}", &["GET"], "user"),
			RouteInfo::new("/_debug_toolbar/static/{*path}", &["GET"], "static_asset"),
		])
		.build()
		.unwrap();

	let body = send(wrap(&layer), get("/")).await.text();
	assert!(body.contains("TOTAL: "));
	assert!(body.contains("2 routes"));
	assert!(!body.contains("static_asset"));
}

#[rstest]
#[tokio::test]
async fn test_matched_route_with_router_layer(default_config: ToolbarConfig) {
	let toolbar = DebugToolbarLayer::new(default_config.with_panels([REQUEST_VARS_PANEL])).unwrap();
	let app = Router::new()
		.route(
			"/users/{id}",
			get_route(|| async { Html("<html><body>user</body></html>") }),
		)
		.layer(toolbar);

	let response = app.oneshot(get("/users/42?tab=posts")).await.unwrap();
	let body = String::from_utf8(
		http_body_util::BodyExt::collect(response.into_body())
			.await
			.unwrap()
			.to_bytes()
			.to_vec(),
	)
	.unwrap();
	assert!(body.contains("GET &#x2F;users&#x2F;{id}"));
	assert!(body.contains("tab"));
	assert!(body.contains("42"));
}

#[rstest]
#[tokio::test]
async fn test_recorder_extractor_without_toolbar() {
	let layer = DebugToolbarLayer::new(ToolbarConfig::default().enabled(false)).unwrap();
	let response = send(wrap(&layer), get("/queries")).await;
	assert_eq!(response.status, http::StatusCode::OK);
	assert_eq!(response.body, crate::common::handlers::PAGE.as_bytes());
}
