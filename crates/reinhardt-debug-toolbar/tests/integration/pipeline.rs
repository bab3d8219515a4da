//! Request pipeline: session lifecycle, eligibility and injection

use crate::common::fixtures::*;
use crate::common::handlers::PAGE;
use crate::common::mock_panel::MockPanel;
use futures::FutureExt;
use http::StatusCode;
use reinhardt_debug_toolbar::utils::gzip;
use reinhardt_debug_toolbar::{DebugToolbarLayer, ToolbarConfig};
use rstest::*;
use std::panic::AssertUnwindSafe;

#[rstest]
#[tokio::test]
async fn test_injects_before_body_end(default_config: ToolbarConfig) {
	let response = send(toolbar_app(default_config), get("/")).await;
	assert_eq!(response.status, StatusCode::OK);
	assert!(response.has_toolbar());

	let body = response.text();
	let (prefix, suffix) = PAGE.split_once("</body>").unwrap();
	assert!(body.starts_with(prefix));
	assert!(body.ends_with(&format!("</body>{}", suffix)));
	assert!(body.find("id=\"flDebug\"").unwrap() < body.rfind("</body>").unwrap());
	assert_eq!(
		response.header("content-length").unwrap(),
		body.len().to_string()
	);
}

#[rstest]
#[tokio::test]
async fn test_disabled_leaves_body_identical() {
	let config = ToolbarConfig::default().enabled(false);
	let layer = DebugToolbarLayer::new(config).unwrap();
	let response = send(wrap(&layer), get("/")).await;
	assert_eq!(response.body, PAGE.as_bytes());
	assert_eq!(layer.in_flight(), 0);
}

#[rstest]
#[case("/json")]
#[case("/stream")]
#[case("/accepted")]
#[tokio::test]
async fn test_ineligible_responses_untouched(default_config: ToolbarConfig, #[case] uri: &str) {
	let response = send(toolbar_app(default_config), get(uri)).await;
	assert!(!response.has_toolbar());
}

#[rstest]
#[case("/not-found", StatusCode::NOT_FOUND)]
#[case("/created", StatusCode::CREATED)]
#[tokio::test]
async fn test_error_and_created_pages_get_toolbar(
	default_config: ToolbarConfig,
	#[case] uri: &str,
	#[case] status: StatusCode,
) {
	let response = send(toolbar_app(default_config), get(uri)).await;
	assert_eq!(response.status, status);
	assert!(response.has_toolbar());
}

#[rstest]
#[tokio::test]
async fn test_fragment_without_body_tag_untouched(default_config: ToolbarConfig) {
	let response = send(toolbar_app(default_config), get("/fragment")).await;
	assert_eq!(response.text(), "<p>partial</p>");
}

#[rstest]
#[tokio::test]
async fn test_doctype_document_gets_toolbar_appended(default_config: ToolbarConfig) {
	let response = send(toolbar_app(default_config), get("/doctype-only")).await;
	let body = response.text();
	assert!(body.starts_with("<!DOCTYPE html><p>no closing body</p>"));
	assert!(response.has_toolbar());
	assert!(body.trim_end().ends_with("</div>"));
}

#[rstest]
#[tokio::test]
async fn test_gzip_body_recompressed(default_config: ToolbarConfig) {
	let response = send(toolbar_app(default_config), get("/gzip")).await;
	assert_eq!(response.header("content-encoding"), Some("gzip"));
	assert_eq!(
		response.header("content-length").unwrap(),
		response.body.len().to_string()
	);

	let html = String::from_utf8(gzip::decompress(&response.body).unwrap()).unwrap();
	assert!(html.contains("id=\"flDebug\""));
	assert!(html.ends_with("</body></html>"));
}

#[rstest]
#[tokio::test]
async fn test_panel_hooks_run_once_per_request(default_config: ToolbarConfig) {
	let mock = MockPanel::new("tests::Hooks", "Hooks").with_view_header("wrapped");
	let counters = mock.counters();
	let layer = DebugToolbarLayer::builder(default_config.with_panels(["tests::Hooks"]))
		.with_panel(mock.descriptor())
		.build()
		.unwrap();

	let response = send(wrap(&layer), get("/")).await;
	assert_eq!(response.header("x-mock-panel"), Some("wrapped"));
	assert!(response.text().contains("mock-panel-Hooks"));

	assert_eq!(counters.created(), 1);
	assert_eq!(counters.process_request(), 1);
	assert_eq!(counters.process_view(), 1);
	assert_eq!(counters.process_response(), 1);
	assert_eq!(counters.content(), 1);
}

#[rstest]
#[tokio::test]
async fn test_hooks_run_for_non_html_responses(default_config: ToolbarConfig) {
	let mock = MockPanel::new("tests::Json", "Json");
	let counters = mock.counters();
	let layer = DebugToolbarLayer::builder(default_config.with_panels(["tests::Json"]))
		.with_panel(mock.descriptor())
		.build()
		.unwrap();

	send(wrap(&layer), get("/json")).await;
	assert_eq!(counters.process_response(), 1);
	assert_eq!(counters.content(), 0);
}

#[rstest]
#[tokio::test]
async fn test_session_removed_after_request(default_config: ToolbarConfig) {
	let layer = DebugToolbarLayer::new(default_config).unwrap();
	send(wrap(&layer), get("/")).await;
	send(wrap(&layer), get("/json")).await;
	assert_eq!(layer.in_flight(), 0);
}

#[rstest]
#[tokio::test]
async fn test_session_removed_when_handler_panics(default_config: ToolbarConfig) {
	let layer = DebugToolbarLayer::new(default_config).unwrap();
	let result = AssertUnwindSafe(send(wrap(&layer), get("/panic")))
		.catch_unwind()
		.await;
	assert!(result.is_err());
	assert_eq!(layer.in_flight(), 0);
}

#[rstest]
#[case("127.0.0.1:5000", true)]
#[case("[::1]:5000", true)]
#[case("10.0.0.8:5000", false)]
#[tokio::test]
async fn test_hosts_restriction(
	localhost_config: ToolbarConfig,
	#[case] peer: &str,
	#[case] expected: bool,
) {
	let response = send(toolbar_app(localhost_config), get_from("/", peer)).await;
	assert_eq!(response.has_toolbar(), expected);
}

#[rstest]
#[tokio::test]
async fn test_hosts_restriction_without_peer_address(localhost_config: ToolbarConfig) {
	let response = send(toolbar_app(localhost_config), get("/")).await;
	assert!(!response.has_toolbar());
	assert_eq!(response.body, PAGE.as_bytes());
}

#[rstest]
#[tokio::test]
async fn test_toolbar_routes_get_no_session(default_config: ToolbarConfig) {
	let mock = MockPanel::new("tests::Static", "Static");
	let counters = mock.counters();
	let layer = DebugToolbarLayer::builder(default_config.with_panels(["tests::Static"]))
		.with_panel(mock.descriptor())
		.build()
		.unwrap();

	let response = send(wrap(&layer), get("/_debug_toolbar/static/toolbar.css")).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.header("content-type"), Some("text/css; charset=utf-8"));
	assert!(!response.has_toolbar());
	assert_eq!(counters.created(), 0);
}

#[rstest]
#[case("debug.local", StatusCode::OK)]
#[case("debug.local:3000", StatusCode::OK)]
#[case("app.local:3000", StatusCode::NOT_FOUND)]
#[tokio::test]
async fn test_routes_host(
	default_config: ToolbarConfig,
	#[case] host: &str,
	#[case] expected: StatusCode,
) {
	let config = default_config
		.with_routes_host("debug.local")
		.with_host_matching(true);
	let request = http::Request::builder()
		.uri("/_debug_toolbar/static/toolbar.js")
		.header(http::header::HOST, host)
		.body(axum::body::Body::empty())
		.unwrap();
	let response = send(toolbar_app(config), request).await;
	assert_eq!(response.status, expected);
}
