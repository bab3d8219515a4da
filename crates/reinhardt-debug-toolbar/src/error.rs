//! Toolbar error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type for toolbar operations.
pub type ToolbarResult<T> = Result<T, ToolbarError>;

/// Signed token verification failures.
///
/// Both variants are client-facing rejections and are answered with
/// `406 Not Acceptable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
	/// The token is malformed or its signature does not match.
	#[error("invalid signature")]
	InvalidSignature,

	/// The token verified but does not carry a read-only statement.
	#[error("rejected statement: only select statements can be replayed")]
	RejectedStatement,
}

/// Debug toolbar errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolbarError {
	/// The toolbar is enabled but no secret key was configured.
	#[error("the debug toolbar requires a non-empty `secret_key` when enabled")]
	MissingSecretKey,

	/// `host_matching` is on but `routes_host` is not set.
	#[error("`routes_host` must be set when `host_matching` is enabled")]
	InvalidHostMatching,

	/// A built-in or custom template could not be parsed or rendered.
	#[error("template error: {0}")]
	Template(String),

	/// A panel failed while registering its routes.
	#[error("panel '{identifier}' failed to load: {message}")]
	PanelLoad {
		/// Panel identifier.
		identifier: String,
		/// Failure description.
		message: String,
	},

	/// A panel factory failed to build an instance.
	#[error("panel '{identifier}' failed to initialize: {message}")]
	PanelInit {
		/// Panel identifier.
		identifier: String,
		/// Failure description.
		message: String,
	},

	/// Panel content could not be rendered.
	#[error("render error: {0}")]
	Render(String),

	/// Signed token rejected.
	#[error(transparent)]
	Signing(#[from] SigningError),

	/// The template editor was used without being enabled.
	#[error("the template editor is disabled")]
	EditorDisabled,

	/// Requested toolbar resource does not exist.
	#[error("not found: {0}")]
	NotFound(String),

	/// Malformed diagnostic request.
	#[error("bad request: {0}")]
	BadRequest(String),

	/// Query replay failed in the host executor.
	#[error("query execution failed: {0}")]
	Query(String),

	/// IO error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<tera::Error> for ToolbarError {
	fn from(err: tera::Error) -> Self {
		// Tera nests the useful message in the source chain
		let mut message = err.to_string();
		let mut source = std::error::Error::source(&err);
		while let Some(inner) = source {
			message.push_str(": ");
			message.push_str(&inner.to_string());
			source = inner.source();
		}
		Self::Template(message)
	}
}

impl ToolbarError {
	/// HTTP status used when this error reaches a toolbar endpoint.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Signing(_) => StatusCode::NOT_ACCEPTABLE,
			Self::EditorDisabled => StatusCode::FORBIDDEN,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ToolbarError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let body = if status.is_server_error() {
			tracing::warn!(error = %self, "debug toolbar view failed");
			"Internal debug toolbar error".to_string()
		} else {
			self.to_string()
		};
		(status, body).into_response()
	}
}
