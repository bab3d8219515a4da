//! Panel registry
//!
//! Maps configured panel identifiers to factories. Resolution results are
//! cached, including failures, so an identifier that cannot be resolved is
//! reported once and then skipped for the lifetime of the registry.

use super::{Panel, PanelInit};
use crate::context::ToolbarServices;
use crate::error::{ToolbarError, ToolbarResult};
use axum::Router;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Builds a per-request panel instance.
pub type PanelFactory = Arc<dyn Fn(&PanelInit) -> ToolbarResult<Box<dyn Panel>> + Send + Sync>;

/// Builds the side-channel routes a panel serves under `/_debug_toolbar/views`.
pub type RouteRegistrar = Arc<
	dyn Fn(&ToolbarServices) -> ToolbarResult<Option<Router<Arc<ToolbarServices>>>> + Send + Sync,
>;

/// A registered panel type.
#[derive(Clone)]
pub struct PanelDescriptor {
	identifier: String,
	name: String,
	factory: PanelFactory,
	routes: Option<RouteRegistrar>,
}

impl PanelDescriptor {
	/// Describe a panel type.
	pub fn new<F>(identifier: impl Into<String>, name: impl Into<String>, factory: F) -> Self
	where
		F: Fn(&PanelInit) -> ToolbarResult<Box<dyn Panel>> + Send + Sync + 'static,
	{
		Self {
			identifier: identifier.into(),
			name: name.into(),
			factory: Arc::new(factory),
			routes: None,
		}
	}

	/// Attach a route registrar.
	pub fn with_routes<R>(mut self, registrar: R) -> Self
	where
		R: Fn(&ToolbarServices) -> ToolbarResult<Option<Router<Arc<ToolbarServices>>>>
			+ Send
			+ Sync
			+ 'static,
	{
		self.routes = Some(Arc::new(registrar));
		self
	}

	/// Identifier used in the `panels` configuration list
	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	/// Display name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Instantiate the panel for one request.
	pub fn create(&self, init: &PanelInit) -> ToolbarResult<Box<dyn Panel>> {
		(self.factory)(init)
	}

	fn register_routes(
		&self,
		services: &ToolbarServices,
	) -> ToolbarResult<Option<Router<Arc<ToolbarServices>>>> {
		let Some(registrar) = &self.routes else {
			return Ok(None);
		};
		match std::panic::catch_unwind(AssertUnwindSafe(|| registrar(services))) {
			Ok(result) => result,
			Err(_) => Err(ToolbarError::PanelLoad {
				identifier: self.identifier.clone(),
				message: "route registration panicked".to_string(),
			}),
		}
	}
}

impl std::fmt::Debug for PanelDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PanelDescriptor")
			.field("identifier", &self.identifier)
			.field("name", &self.name)
			.field("has_routes", &self.routes.is_some())
			.finish_non_exhaustive()
	}
}

/// Registry of panel factories with a resolution cache.
#[derive(Default)]
pub struct PanelRegistry {
	factories: HashMap<String, Arc<PanelDescriptor>>,
	cache: RwLock<HashMap<String, Option<Arc<PanelDescriptor>>>>,
}

impl PanelRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry holding every built-in panel.
	pub fn with_builtin() -> Self {
		let mut registry = Self::new();
		registry.register(super::version::descriptor());
		registry.register(super::timer::descriptor());
		registry.register(super::headers::descriptor());
		registry.register(super::request_vars::descriptor());
		registry.register(super::config_vars::descriptor());
		registry.register(super::template::descriptor());
		registry.register(super::sql::descriptor());
		registry.register(super::logging::descriptor());
		registry.register(super::route_list::descriptor());
		registry.register(super::profiler::descriptor());
		registry.register(super::request_globals::descriptor());
		registry
	}

	/// Register a panel type, replacing any previous one with the same
	/// identifier.
	pub fn register(&mut self, descriptor: PanelDescriptor) {
		let identifier = descriptor.identifier.clone();
		self.cache.get_mut().remove(&identifier);
		self.factories.insert(identifier, Arc::new(descriptor));
	}

	/// Number of registered panel types
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	/// Whether no panel type is registered
	pub fn is_empty(&self) -> bool {
		self.factories.is_empty()
	}

	/// Resolve an identifier, consulting the cache first.
	///
	/// Unknown identifiers are logged once and resolve to `None` from then on.
	pub fn resolve(&self, identifier: &str) -> Option<Arc<PanelDescriptor>> {
		if let Some(cached) = self.cache.read().get(identifier) {
			return cached.clone();
		}

		let mut cache = self.cache.write();
		if let Some(cached) = cache.get(identifier) {
			return cached.clone();
		}

		let resolved = self.factories.get(identifier).cloned();
		if resolved.is_none() {
			tracing::warn!(
				panel = identifier,
				"Disabled {} because no panel is registered under that name",
				identifier
			);
		}
		cache.insert(identifier.to_string(), resolved.clone());
		resolved
	}

	/// Resolve every configured identifier and collect their routes.
	///
	/// Called once when the toolbar is built. The returned router holds the
	/// toolbar's static routes plus the routes of every loaded panel. A panel
	/// whose route registrar fails, or whose routes overlap routes already
	/// loaded, is logged and excluded from every later session. Repeated
	/// identifiers are loaded once.
	pub fn load_panels(
		&self,
		identifiers: &[String],
		services: &ToolbarServices,
	) -> Router<Arc<ToolbarServices>> {
		let mut router = crate::views::static_routes();
		let mut loaded = HashSet::new();
		for identifier in identifiers {
			if !loaded.insert(identifier.as_str()) {
				continue;
			}
			let Some(descriptor) = self.resolve(identifier) else {
				continue;
			};
			let merged = descriptor
				.register_routes(services)
				.and_then(|routes| match routes {
					Some(routes) => merge_routes(&router, routes, identifier).map(Some),
					None => Ok(None),
				});
			match merged {
				Ok(Some(merged)) => router = merged,
				Ok(None) => {}
				Err(err) => {
					tracing::warn!(panel = %identifier, error = %err, "Disabled {} because it failed to load", identifier);
					self.cache.write().insert(identifier.clone(), None);
				}
			}
		}
		router
	}

	/// Resolved descriptors in configured order, skipping unresolvable and
	/// repeated ones.
	pub fn iter_panels<'a>(
		&'a self,
		identifiers: &'a [String],
	) -> impl Iterator<Item = Arc<PanelDescriptor>> + 'a {
		let mut seen = HashSet::new();
		identifiers
			.iter()
			.filter(move |id| seen.insert(id.as_str()))
			.filter_map(|id| self.resolve(id))
	}
}

// `Router::merge` panics on overlapping routes; the loaded router is left
// untouched when it does.
fn merge_routes(
	router: &Router<Arc<ToolbarServices>>,
	routes: Router<Arc<ToolbarServices>>,
	identifier: &str,
) -> ToolbarResult<Router<Arc<ToolbarServices>>> {
	let base = router.clone();
	std::panic::catch_unwind(AssertUnwindSafe(move || base.merge(routes))).map_err(|panic| {
		let message = panic
			.downcast_ref::<String>()
			.cloned()
			.or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
			.unwrap_or_else(|| "overlapping routes".to_string());
		ToolbarError::PanelLoad {
			identifier: identifier.to_string(),
			message,
		}
	})
}

impl std::fmt::Debug for PanelRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut identifiers: Vec<&String> = self.factories.keys().collect();
		identifiers.sort();
		f.debug_struct("PanelRegistry")
			.field("factories", &identifiers)
			.finish_non_exhaustive()
	}
}
