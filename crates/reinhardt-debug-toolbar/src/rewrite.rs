//! Response rewriting
//!
//! Runs at most once per response, in two stages: redirect interception,
//! then toolbar injection into buffered HTML bodies.

use crate::error::ToolbarResult;
use crate::ui::ToolbarTemplates;
use crate::utils::gzip;
use axum::body::{Body, HttpBody as _};
use bytes::Bytes;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use http_body_util::BodyExt;

/// Status codes whose HTML bodies receive the toolbar.
pub const TOOLBAR_CODES: [u16; 12] = [200, 201, 400, 401, 403, 404, 405, 500, 501, 502, 503, 504];

/// Status codes treated as redirects.
pub const REDIRECT_CODES: [u16; 4] = [301, 302, 303, 304];

const BODY_END: &[u8] = b"</body>";
const DOCTYPE: &[u8] = b"<!doctype html>";

/// Marker placed in response extensions once a response was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarRewritten;

/// Stage of a [`ResponseRewriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteState {
	/// Nothing inspected yet
	Start,
	/// Checking for a redirect to intercept
	MaybeRedirect,
	/// Checking whether the body can take the toolbar
	MaybeInject,
	/// Finished; the response is final
	Done,
}

/// Where the toolbar goes in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
	/// Insert at this byte offset, the start of the last `</body>`
	BeforeBodyEnd(usize),
	/// No `</body>` but the document starts with an HTML5 doctype
	Append,
	/// Neither found; leave the body alone
	NotFound,
}

/// Locate the injection point in an HTML document.
///
/// Matching is ASCII case-insensitive and works on raw bytes, so bodies that
/// are not valid UTF-8 are handled too.
pub fn find_injection_point(html: &[u8]) -> InjectionOutcome {
	if let Some(pos) = html
		.windows(BODY_END.len())
		.rposition(|window| window.eq_ignore_ascii_case(BODY_END))
	{
		return InjectionOutcome::BeforeBodyEnd(pos);
	}
	if html.len() >= DOCTYPE.len() && html[..DOCTYPE.len()].eq_ignore_ascii_case(DOCTYPE) {
		return InjectionOutcome::Append;
	}
	InjectionOutcome::NotFound
}

/// Splice `overlay` into `html` at `outcome`; `None` when not found.
pub fn inject_overlay(html: &[u8], overlay: &str, outcome: InjectionOutcome) -> Option<Vec<u8>> {
	let at = match outcome {
		InjectionOutcome::BeforeBodyEnd(pos) => pos,
		InjectionOutcome::Append => html.len(),
		InjectionOutcome::NotFound => return None,
	};
	let mut out = Vec::with_capacity(html.len() + overlay.len());
	out.extend_from_slice(&html[..at]);
	out.extend_from_slice(overlay.as_bytes());
	out.extend_from_slice(&html[at..]);
	Some(out)
}

fn header_str<'a>(headers: &'a HeaderMap, name: http::header::HeaderName) -> &'a str {
	headers
		.get(name)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("")
}

fn is_chunked(headers: &HeaderMap) -> bool {
	header_str(headers, TRANSFER_ENCODING)
		.to_ascii_lowercase()
		.contains("chunked")
}

fn set_content_length(headers: &mut HeaderMap, len: usize) {
	headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
}

/// Rewrites one response.
pub struct ResponseRewriter<'a> {
	templates: &'a ToolbarTemplates,
	intercept_redirects: bool,
	state: RewriteState,
}

impl<'a> ResponseRewriter<'a> {
	/// Create a rewriter in the [`RewriteState::Start`] state.
	pub fn new(templates: &'a ToolbarTemplates, intercept_redirects: bool) -> Self {
		Self {
			templates,
			intercept_redirects,
			state: RewriteState::Start,
		}
	}

	/// Current stage
	pub fn state(&self) -> RewriteState {
		self.state
	}

	/// Apply redirect interception and toolbar injection.
	///
	/// `render_overlay` is only called when the body can take the toolbar.
	/// Every failure is logged and leaves the response as it was.
	pub async fn rewrite<F>(&mut self, response: Response<Body>, render_overlay: F) -> Response<Body>
	where
		F: FnOnce() -> ToolbarResult<String>,
	{
		if self.state == RewriteState::Done
			|| response.extensions().get::<ToolbarRewritten>().is_some()
		{
			self.state = RewriteState::Done;
			return response;
		}

		self.state = RewriteState::MaybeRedirect;
		let response = self.intercept_redirect(response);

		self.state = RewriteState::MaybeInject;
		let mut response = self.inject(response, render_overlay).await;

		self.state = RewriteState::Done;
		response.extensions_mut().insert(ToolbarRewritten);
		response
	}

	fn intercept_redirect(&self, response: Response<Body>) -> Response<Body> {
		if !self.intercept_redirects || !REDIRECT_CODES.contains(&response.status().as_u16()) {
			return response;
		}
		let location = header_str(response.headers(), LOCATION).to_string();
		if location.is_empty() {
			return response;
		}

		let mut context = tera::Context::new();
		context.insert("redirect_to", &location);
		context.insert("redirect_code", &response.status().as_u16());
		let page = match self.templates.render("redirect.html", &context) {
			Ok(page) => page,
			Err(err) => {
				tracing::warn!(error = %err, "could not render redirect page");
				return response;
			}
		};

		let (mut parts, _) = response.into_parts();
		parts.status = StatusCode::OK;
		parts.headers.remove(LOCATION);
		parts.headers.remove(CONTENT_ENCODING);
		parts.headers.remove(TRANSFER_ENCODING);
		parts.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		set_content_length(&mut parts.headers, page.len());
		Response::from_parts(parts, Body::from(page))
	}

	async fn inject<F>(&self, response: Response<Body>, render_overlay: F) -> Response<Body>
	where
		F: FnOnce() -> ToolbarResult<String>,
	{
		let headers = response.headers();
		let eligible = TOOLBAR_CODES.contains(&response.status().as_u16())
			&& header_str(headers, CONTENT_TYPE).starts_with("text/html")
			&& response.body().size_hint().exact().is_some()
			&& !is_chunked(headers);
		if !eligible {
			return response;
		}

		let (mut parts, body) = response.into_parts();
		let original = match body.collect().await {
			Ok(collected) => collected.to_bytes(),
			Err(err) => {
				// The partially read body is gone; the headers must describe
				// the empty replacement.
				tracing::warn!(error = %err, "could not read response body for the debug toolbar");
				parts.headers.remove(CONTENT_ENCODING);
				set_content_length(&mut parts.headers, 0);
				return Response::from_parts(parts, Body::empty());
			}
		};
		let restore = |parts, original: Bytes| Response::from_parts(parts, Body::from(original));

		let gzipped = gzip::is_gzip_encoding(header_str(&parts.headers, CONTENT_ENCODING));
		let html = if gzipped {
			match gzip::decompress(&original) {
				Ok(html) => html,
				Err(err) => {
					tracing::warn!(error = %err, "could not decompress response for the debug toolbar");
					return restore(parts, original);
				}
			}
		} else {
			original.to_vec()
		};

		let outcome = find_injection_point(&html);
		if outcome == InjectionOutcome::NotFound {
			tracing::warn!("Could not insert debug toolbar. </body> tag not found in response.");
			return restore(parts, original);
		}

		let overlay = match render_overlay() {
			Ok(overlay) => overlay,
			Err(err) => {
				tracing::warn!(error = %err, "could not render the debug toolbar");
				return restore(parts, original);
			}
		};

		let Some(mut content) = inject_overlay(&html, &overlay, outcome) else {
			return restore(parts, original);
		};
		if gzipped {
			content = match gzip::compress(&content) {
				Ok(compressed) => compressed,
				Err(err) => {
					tracing::warn!(error = %err, "could not recompress response for the debug toolbar");
					return restore(parts, original);
				}
			};
		}

		set_content_length(&mut parts.headers, content.len());
		Response::from_parts(parts, Body::from(content))
	}
}
