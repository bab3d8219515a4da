//! Debug toolbar Tower layer

use super::service::ToolbarShared;
use crate::context::{QueryExecutor, RouteInfo, ToolbarServices};
use crate::error::ToolbarResult;
use crate::middleware::{DebugToolbarService, ToolbarConfig};
use crate::panels::{PanelDescriptor, PanelRegistry};
use crate::store::RequestSessionStore;
use crate::views::{static_routes, toolbar_router};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::Layer;

/// Tower layer for debug toolbar middleware
///
/// ```rust,ignore
/// use reinhardt_debug_toolbar::{DebugToolbarLayer, ToolbarConfig};
/// use tower::Layer;
///
/// let toolbar = DebugToolbarLayer::new(ToolbarConfig::new("dev-secret"))?;
/// let app = toolbar.layer(Router::new().route("/", get(index)));
/// ```
#[derive(Clone)]
pub struct DebugToolbarLayer {
	shared: Arc<ToolbarShared>,
}

impl DebugToolbarLayer {
	/// Create a toolbar with the built-in panels.
	///
	/// Fails when the configuration is invalid or the built-in templates do
	/// not load.
	pub fn new(config: ToolbarConfig) -> ToolbarResult<Self> {
		Self::builder(config).build()
	}

	/// Start configuring a toolbar.
	pub fn builder(config: ToolbarConfig) -> DebugToolbarBuilder {
		DebugToolbarBuilder {
			config,
			registry: PanelRegistry::with_builtin(),
			executor: None,
			routes: Vec::new(),
			app_config: BTreeMap::new(),
			packages: Vec::new(),
		}
	}

	/// Services shared by all sessions
	pub fn services(&self) -> &Arc<ToolbarServices> {
		&self.shared.services
	}

	/// Number of requests currently holding a toolbar session
	pub fn in_flight(&self) -> usize {
		self.shared.store.len()
	}
}

impl std::fmt::Debug for DebugToolbarLayer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DebugToolbarLayer")
			.field("services", &self.shared.services)
			.field("registry", &self.shared.registry)
			.finish_non_exhaustive()
	}
}

/// Builder for [`DebugToolbarLayer`]
pub struct DebugToolbarBuilder {
	config: ToolbarConfig,
	registry: PanelRegistry,
	executor: Option<Arc<dyn QueryExecutor>>,
	routes: Vec<RouteInfo>,
	app_config: BTreeMap<String, Value>,
	packages: Vec<(String, String)>,
}

impl DebugToolbarBuilder {
	/// Replace the panel registry.
	pub fn with_registry(mut self, registry: PanelRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Register a custom panel type next to the built-in ones.
	///
	/// The panel is only shown when its identifier is listed in
	/// [`ToolbarConfig::panels`].
	pub fn with_panel(mut self, descriptor: PanelDescriptor) -> Self {
		self.registry.register(descriptor);
		self
	}

	/// Executor used by the SQL select/explain views.
	pub fn with_executor(mut self, executor: impl QueryExecutor + 'static) -> Self {
		self.executor = Some(Arc::new(executor));
		self
	}

	/// Routing table shown by the route list panel.
	pub fn with_routes(mut self, routes: impl IntoIterator<Item = RouteInfo>) -> Self {
		self.routes = routes.into_iter().collect();
		self
	}

	/// Application settings shown by the config panel.
	pub fn with_app_config(mut self, config: BTreeMap<String, Value>) -> Self {
		self.app_config = config;
		self
	}

	/// Add an application setting shown by the config panel.
	pub fn with_app_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.app_config.insert(key.into(), value.into());
		self
	}

	/// Packages and versions listed by the version panel.
	pub fn with_packages<I, N, V>(mut self, packages: I) -> Self
	where
		I: IntoIterator<Item = (N, V)>,
		N: Into<String>,
		V: Into<String>,
	{
		self.packages = packages
			.into_iter()
			.map(|(name, version)| (name.into(), version.into()))
			.collect();
		self
	}

	/// Validate the configuration, load the panels and build the layer.
	pub fn build(self) -> ToolbarResult<DebugToolbarLayer> {
		self.config.validate()?;

		let mut services = ToolbarServices::new(self.config)?;
		services.executor = self.executor;
		services.routes = self.routes;
		services.app_config = self.app_config;
		services.packages = self.packages;

		let routes = if services.config().enabled {
			self.registry
				.load_panels(&services.config().panels, &services)
		} else {
			static_routes()
		};
		let services = Arc::new(services);
		let router = toolbar_router(routes, Arc::clone(&services));

		tracing::debug!(
			enabled = services.config().enabled,
			panels = ?services.config().panels,
			"debug toolbar configured"
		);

		Ok(DebugToolbarLayer {
			shared: Arc::new(ToolbarShared {
				services,
				registry: Arc::new(self.registry),
				store: Arc::new(RequestSessionStore::new()),
				router,
			}),
		})
	}
}

impl<S> Layer<S> for DebugToolbarLayer {
	type Service = DebugToolbarService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		DebugToolbarService {
			inner,
			shared: Arc::clone(&self.shared),
		}
	}
}
