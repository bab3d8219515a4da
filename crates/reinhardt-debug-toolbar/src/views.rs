//! Toolbar HTTP endpoints
//!
//! Everything below `/_debug_toolbar/` is served by a router owned by the
//! toolbar: embedded static assets plus the side-channel views registered by
//! panels. These requests never get a toolbar session.

pub mod sql;
pub mod template;

use crate::context::ToolbarServices;
use crate::error::{ToolbarError, ToolbarResult};
use crate::ui::assets;
use axum::Router;
use axum::extract::Path;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use http::header::CONTENT_TYPE;
use std::sync::Arc;

/// Prefix of every toolbar route.
pub const TOOLBAR_PREFIX: &str = "/_debug_toolbar";

/// Base path of the static assets.
pub const STATIC_PATH: &str = "/_debug_toolbar/static/";

/// Base path of panel views.
pub const VIEWS_PATH: &str = "/_debug_toolbar/views/";

/// Whether a request path belongs to the toolbar.
pub fn is_toolbar_path(path: &str) -> bool {
	path == TOOLBAR_PREFIX
		|| path
			.strip_prefix(TOOLBAR_PREFIX)
			.is_some_and(|rest| rest.starts_with('/'))
}

/// Routes every toolbar serves regardless of the loaded panels.
pub(crate) fn static_routes() -> Router<Arc<ToolbarServices>> {
	Router::new().route("/_debug_toolbar/static/{*path}", get(static_asset))
}

/// Build the router serving toolbar requests from the loaded routes.
pub(crate) fn toolbar_router(
	routes: Router<Arc<ToolbarServices>>,
	services: Arc<ToolbarServices>,
) -> Router {
	routes.with_state(services)
}

async fn static_asset(Path(path): Path<String>) -> ToolbarResult<Response> {
	let asset = assets::lookup(&path).ok_or_else(|| ToolbarError::NotFound(path.clone()))?;
	Ok(([(CONTENT_TYPE, asset.content_type)], asset.body).into_response())
}
