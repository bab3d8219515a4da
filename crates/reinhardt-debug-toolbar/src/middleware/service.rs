//! Debug toolbar Tower service

use crate::capture::Recorder;
use crate::context::{RequestInfo, ResponseInfo, ToolbarServices};
use crate::panels::{PanelRegistry, ViewHandler};
use crate::rewrite::ResponseRewriter;
use crate::session::{ToolbarSession, parse_activation_cookie};
use crate::store::{RequestId, RequestSessionStore};
use crate::views::is_toolbar_path;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use http::header::HOST;
use http::{Request, Response};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::BoxCloneService;
use tower::{Service, ServiceExt};

/// State shared by every clone of the service.
pub(crate) struct ToolbarShared {
	pub(crate) services: Arc<ToolbarServices>,
	pub(crate) registry: Arc<PanelRegistry>,
	pub(crate) store: Arc<RequestSessionStore>,
	pub(crate) router: Router,
}

impl ToolbarShared {
	fn serves_toolbar_routes(&self, request: &Request<Body>) -> bool {
		if !is_toolbar_path(request.uri().path()) {
			return false;
		}
		let Some(routes_host) = &self.services.config().routes_host else {
			return true;
		};
		request
			.headers()
			.get(HOST)
			.and_then(|value| value.to_str().ok())
			.map(strip_port)
			.is_some_and(|host| host.eq_ignore_ascii_case(routes_host))
	}

	fn allows(&self, request: &Request<Body>) -> bool {
		let addr = request
			.extensions()
			.get::<ConnectInfo<SocketAddr>>()
			.map(|info| info.0.ip());
		self.services.config().allows(addr)
	}
}

fn strip_port(host: &str) -> &str {
	if let Some(rest) = host.strip_prefix('[') {
		// [::1]:8000
		return rest.split_once(']').map_or(host, |(addr, _)| addr);
	}
	match host.rsplit_once(':') {
		Some((name, port)) if !name.contains(':') && port.parse::<u16>().is_ok() => name,
		_ => host,
	}
}

/// Tower service running the debug toolbar around an inner service
///
/// Built by [`DebugToolbarLayer`](super::DebugToolbarLayer).
#[derive(Clone)]
pub struct DebugToolbarService<S> {
	pub(crate) inner: S,
	pub(crate) shared: Arc<ToolbarShared>,
}

impl<S> DebugToolbarService<S> {
	/// Number of requests currently holding a toolbar session
	pub fn in_flight(&self) -> usize {
		self.shared.store.len()
	}
}

impl<S> Service<Request<Body>> for DebugToolbarService<S>
where
	S: Service<Request<Body>, Response = Response<Body>, Error = Infallible>
		+ Clone
		+ Send
		+ 'static,
	S::Future: Send + 'static,
{
	type Response = Response<Body>;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request<Body>) -> Self::Future {
		// The clone may not be ready; keep the one that is
		let clone = self.inner.clone();
		let inner = std::mem::replace(&mut self.inner, clone);
		let shared = Arc::clone(&self.shared);

		if !shared.services.config().enabled {
			return Box::pin(inner.oneshot(request));
		}
		if shared.serves_toolbar_routes(&request) {
			return Box::pin(shared.router.clone().oneshot(request));
		}
		if !shared.allows(&request) {
			return Box::pin(inner.oneshot(request));
		}

		Box::pin(handle(shared, BoxCloneService::new(inner), request))
	}
}

async fn handle(
	shared: Arc<ToolbarShared>,
	view: ViewHandler,
	request: Request<Body>,
) -> Result<Response<Body>, Infallible> {
	let services = &shared.services;
	let config = services.config();

	let request_id = RequestId::new();
	let recorder = Recorder::new(config.record_queries);
	let activated = parse_activation_cookie(request.headers());

	let session = ToolbarSession::create(
		request_id,
		&activated,
		&shared.registry,
		Arc::clone(services),
		recorder.clone(),
	);
	// Removes the session however this future ends
	let guard = shared.store.create(session);

	let (mut parts, body) = request.into_parts();
	parts.extensions.insert(request_id);
	parts.extensions.insert(recorder.clone());
	let info = RequestInfo::from_parts(&parts, request_id);
	let request = Request::from_parts(parts, body);

	guard.session().lock().process_request(&info);
	let view = guard.session().lock().process_view(&info, view);

	let Ok(response) = recorder.scope(view.oneshot(request)).await;

	let (parts, body) = response.into_parts();
	let response_info = ResponseInfo::from_parts(&parts);
	guard
		.session()
		.lock()
		.process_response(&info, &response_info);
	let response = Response::from_parts(parts, body);

	let mut rewriter = ResponseRewriter::new(services.templates(), config.intercept_redirects);
	let response = rewriter
		.rewrite(response, || {
			guard.session().lock().render(services.templates())
		})
		.await;

	tracing::debug!(
		request_id = %request_id,
		status = %response.status(),
		"debug toolbar request finished"
	);
	drop(guard);
	Ok(response)
}
