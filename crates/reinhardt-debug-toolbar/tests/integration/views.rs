//! Toolbar views: query replay and the template editor

use crate::common::fixtures::*;
use crate::common::handlers::TEMPLATE_ROUTE;
use crate::common::mock_panel::MockPanel;
use axum::Router;
use axum::routing::get as get_route;
use http::StatusCode;
use reinhardt_debug_toolbar::panels::{SQL_PANEL, TIMER_PANEL};
use reinhardt_debug_toolbar::{DebugToolbarLayer, ToolbarConfig};
use rstest::*;
use serde_json::{Value, json};

fn layer_with_executor(config: ToolbarConfig, executor: &MockExecutor) -> DebugToolbarLayer {
	DebugToolbarLayer::builder(config)
		.with_executor(executor.clone())
		.build()
		.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_select_replays_signed_query(default_config: ToolbarConfig) {
	let executor = MockExecutor::new("sqlite");
	let layer = layer_with_executor(default_config, &executor);

	let page = send(wrap(&layer), get("/queries")).await.text();
	let token = query_token(&page).expect("select queries get replay links");

	let response = send(
		wrap(&layer),
		get(&format!("/_debug_toolbar/views/sql/select?query={}&duration=3.0", token)),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.text();
	assert!(body.contains("alice"));
	assert!(body.contains("bob"));

	assert_eq!(
		executor.executed(),
		vec![("SELECT * FROM users WHERE id = ?".to_string(), json!([1]))]
	);
}

#[rstest]
#[case("sqlite", "EXPLAIN QUERY PLAN\nSELECT * FROM users WHERE id = ?")]
#[case("postgres", "EXPLAIN\nSELECT * FROM users WHERE id = ?")]
#[tokio::test]
async fn test_explain_prefixes_statement(
	default_config: ToolbarConfig,
	#[case] dialect: &'static str,
	#[case] expected: &str,
) {
	let executor = MockExecutor::new(dialect);
	let layer = layer_with_executor(default_config, &executor);
	let token = layer
		.services()
		.signer()
		.sign("SELECT * FROM users WHERE id = ?", &json!([7]))
		.unwrap();

	let response = send(
		wrap(&layer),
		post_form(
			&format!("/_debug_toolbar/views/sql/explain?query={}&duration=1.5", token),
			&[],
		),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(executor.executed()[0].0, expected);
	assert_eq!(executor.executed()[0].1, json!([7]));
}

#[rstest]
#[case("/_debug_toolbar/views/sql/select?query=forged.token&duration=1", StatusCode::NOT_ACCEPTABLE)]
#[case("/_debug_toolbar/views/sql/explain?query=&duration=1", StatusCode::NOT_ACCEPTABLE)]
#[case("/_debug_toolbar/views/sql/select?duration=1", StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_replay_rejections(
	default_config: ToolbarConfig,
	#[case] uri: &str,
	#[case] expected: StatusCode,
) {
	let executor = MockExecutor::new("sqlite");
	let layer = layer_with_executor(default_config, &executor);
	let response = send(wrap(&layer), get(uri)).await;
	assert_eq!(response.status, expected);
	assert!(executor.executed().is_empty());
}

#[rstest]
#[case("")]
#[case("&duration=soon")]
#[tokio::test]
async fn test_replay_requires_numeric_duration(default_config: ToolbarConfig, #[case] suffix: &str) {
	let executor = MockExecutor::new("sqlite");
	let layer = layer_with_executor(default_config, &executor);
	let token = layer
		.services()
		.signer()
		.sign("SELECT 1 WHERE 1 = ?", &json!([1]))
		.unwrap();

	let uri = format!("/_debug_toolbar/views/sql/select?query={}{}", token, suffix);
	let response = send(wrap(&layer), get(&uri)).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn test_token_from_another_secret_rejected(default_config: ToolbarConfig) {
	let executor = MockExecutor::new("sqlite");
	let layer = layer_with_executor(default_config, &executor);
	let other = DebugToolbarLayer::new(ToolbarConfig::new("another-secret")).unwrap();
	let token = other
		.services()
		.signer()
		.sign("SELECT 1 WHERE 1 = ?", &json!([1]))
		.unwrap();

	let uri = format!("/_debug_toolbar/views/sql/select?query={}&duration=1", token);
	let response = send(wrap(&layer), get(&uri)).await;
	assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
}

#[rstest]
#[tokio::test]
async fn test_replay_without_executor(default_config: ToolbarConfig) {
	let layer = DebugToolbarLayer::new(default_config).unwrap();
	let token = layer
		.services()
		.signer()
		.sign("SELECT 1 WHERE 1 = ?", &json!([1]))
		.unwrap();

	let uri = format!("/_debug_toolbar/views/sql/select?query={}&duration=1", token);
	let response = send(wrap(&layer), get(&uri)).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let page = send(wrap(&layer), get("/queries")).await.text();
	assert!(query_token(&page).is_none());
}

#[rstest]
#[tokio::test]
async fn test_unknown_static_asset(default_config: ToolbarConfig) {
	let response = send(
		toolbar_app(default_config),
		get("/_debug_toolbar/static/missing.png"),
	)
	.await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case("GET", "/_debug_toolbar/views/template/some-key")]
#[case("POST", "/_debug_toolbar/views/template/some-key")]
#[case("POST", "/_debug_toolbar/views/template/some-key/save")]
#[tokio::test]
async fn test_template_editor_disabled(
	default_config: ToolbarConfig,
	#[case] method: &str,
	#[case] uri: &str,
) {
	let request = if method == "GET" {
		get(uri)
	} else {
		post_form(uri, &[("content", "x")])
	};
	let response = send(toolbar_app(default_config), request).await;
	assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[rstest]
#[tokio::test]
async fn test_template_editor_round_trip(default_config: ToolbarConfig) {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("index.html");
	std::fs::write(&path, "<p>Hi {{ user }}</p>").unwrap();

	let layer = DebugToolbarLayer::new(default_config.with_template_editor(true)).unwrap();
	let page_uri = format!(
		"{}?path={}",
		TEMPLATE_ROUTE,
		urlencoding::encode(&path.display().to_string())
	);
	let page = send(wrap(&layer), get(&page_uri)).await.text();
	let key = editor_key(&page).expect("editor link in the template panel");
	let editor_uri = format!("/_debug_toolbar/views/template/{}", key);

	let editor = send(wrap(&layer), get(&editor_uri)).await;
	assert_eq!(editor.status, StatusCode::OK);
	assert!(editor.text().contains("Hi {{ user }}"));

	let preview = send(
		wrap(&layer),
		post_form(&editor_uri, &[("content", "Hello {{ user }}")]),
	)
	.await;
	assert_eq!(preview.status, StatusCode::OK);
	assert_eq!(preview.text(), "Hello alice");

	let broken = send(wrap(&layer), post_form(&editor_uri, &[("content", "{{ user")])).await;
	assert_eq!(broken.status, StatusCode::BAD_REQUEST);
	let error: Value = serde_json::from_slice(&broken.body).unwrap();
	assert!(error["error"].is_string());

	let saved = send(
		wrap(&layer),
		post_form(&format!("{}/save", editor_uri), &[("content", "<p>Bye</p>")]),
	)
	.await;
	assert_eq!(saved.status, StatusCode::OK);
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>Bye</p>");
}

#[rstest]
#[tokio::test]
async fn test_template_editor_unknown_key(default_config: ToolbarConfig) {
	let app = toolbar_app(default_config.with_template_editor(true));
	let response = send(app, get("/_debug_toolbar/views/template/unknown")).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_repeated_panel_identifier_builds(default_config: ToolbarConfig) {
	let executor = MockExecutor::new("sqlite");
	let layer = layer_with_executor(
		default_config.with_panels([TIMER_PANEL, SQL_PANEL, SQL_PANEL]),
		&executor,
	);

	let page = send(wrap(&layer), get("/queries")).await;
	assert!(page.has_toolbar());
	assert_eq!(page.text().matches("id=\"flDebugSQLPanel\"").count(), 1);

	let token = query_token(&page.text()).expect("select queries get replay links");
	let replay = send(
		wrap(&layer),
		get(&format!("/_debug_toolbar/views/sql/select?query={}&duration=1", token)),
	)
	.await;
	assert_eq!(replay.status, StatusCode::OK);
}

#[rstest]
#[tokio::test]
async fn test_panel_with_overlapping_routes_is_disabled(default_config: ToolbarConfig) {
	let executor = MockExecutor::new("sqlite");
	let clash = MockPanel::new("myapp::panels::Clash", "Clash")
		.descriptor()
		.with_routes(|_| {
			Ok(Some(Router::new().route(
				"/_debug_toolbar/views/sql/select",
				get_route(|| async { "clash" }),
			)))
		});
	let layer = DebugToolbarLayer::builder(
		default_config.with_panels([SQL_PANEL, "myapp::panels::Clash"]),
	)
	.with_executor(executor.clone())
	.with_panel(clash)
	.build()
	.unwrap();

	let page = send(wrap(&layer), get("/queries")).await.text();
	assert!(page.contains("flDebugSQLPanel"));
	assert!(!page.contains("flDebugClashPanel"));

	let token = query_token(&page).expect("select queries get replay links");
	let replay = send(
		wrap(&layer),
		get(&format!("/_debug_toolbar/views/sql/select?query={}&duration=1", token)),
	)
	.await;
	assert_eq!(replay.status, StatusCode::OK);
	assert_ne!(replay.text(), "clash");
}

#[rstest]
#[tokio::test]
async fn test_panel_overlapping_static_route_is_disabled(default_config: ToolbarConfig) {
	let clash = MockPanel::new("myapp::panels::Assets", "Assets")
		.descriptor()
		.with_routes(|_| {
			Ok(Some(Router::new().route(
				"/_debug_toolbar/static/{*path}",
				get_route(|| async { "clash" }),
			)))
		});
	let layer = DebugToolbarLayer::builder(default_config.with_panels(["myapp::panels::Assets"]))
		.with_panel(clash)
		.build()
		.unwrap();

	let asset = send(wrap(&layer), get("/_debug_toolbar/static/toolbar.css")).await;
	assert_eq!(asset.status, StatusCode::OK);
	assert_ne!(asset.text(), "clash");
}
