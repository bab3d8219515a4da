//! Query replay views
//!
//! `sql/select` and `sql/explain` re-run a query captured by the SQL panel.
//! The query arrives as a signed token, so only statements the toolbar itself
//! handed out can be executed, and only selects.

use super::VIEWS_PATH;
use crate::context::ToolbarServices;
use crate::error::{ToolbarError, ToolbarResult};
use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;

/// Query string of the replay views.
#[derive(Debug, Default, Deserialize)]
pub struct ReplayParams {
	/// Signed query token
	pub query: Option<String>,
	/// Duration of the original execution in milliseconds
	pub duration: Option<String>,
}

/// Routes of the SQL panel.
pub fn routes() -> Router<Arc<ToolbarServices>> {
	Router::new()
		.route(
			&format!("{VIEWS_PATH}sql/select"),
			get(sql_select).post(sql_select),
		)
		.route(
			&format!("{VIEWS_PATH}sql/explain"),
			get(sql_explain).post(sql_explain),
		)
}

/// Statement actually sent for an explain request.
pub fn explain_statement(dialect: &str, statement: &str) -> String {
	if dialect.eq_ignore_ascii_case("sqlite") {
		format!("EXPLAIN QUERY PLAN\n{}", statement)
	} else {
		format!("EXPLAIN\n{}", statement)
	}
}

async fn sql_select(
	State(services): State<Arc<ToolbarServices>>,
	Query(params): Query<ReplayParams>,
) -> ToolbarResult<Html<String>> {
	replay(&services, params, false).await.map(Html)
}

async fn sql_explain(
	State(services): State<Arc<ToolbarServices>>,
	Query(params): Query<ReplayParams>,
) -> ToolbarResult<Html<String>> {
	replay(&services, params, true).await.map(Html)
}

async fn replay(services: &ToolbarServices, params: ReplayParams, explain: bool) -> ToolbarResult<String> {
	let token = params
		.query
		.ok_or_else(|| ToolbarError::BadRequest("missing `query` parameter".to_string()))?;
	let (statement, values) = services.signer().verify(&token)?;

	let duration: f64 = params
		.duration
		.as_deref()
		.ok_or_else(|| ToolbarError::BadRequest("missing `duration` parameter".to_string()))?
		.parse()
		.map_err(|_| ToolbarError::BadRequest("`duration` must be a number".to_string()))?;

	let executor = services
		.executor()
		.ok_or_else(|| ToolbarError::NotFound("no query executor is registered".to_string()))?;

	let statement = if explain {
		explain_statement(executor.dialect(), &statement)
	} else {
		statement
	};
	let output = executor.execute(&statement, &values).await?;

	let mut context = tera::Context::new();
	context.insert("sql", &statement);
	context.insert("params", &values);
	context.insert("duration", &duration);
	context.insert("columns", &output.columns);
	context.insert("rows", &output.rows);
	services.templates().render("sql_select.html", &context)
}
