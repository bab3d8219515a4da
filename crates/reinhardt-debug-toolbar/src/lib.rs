//! # Reinhardt Debug Toolbar
//!
//! A request-scoped debug toolbar for axum applications.
//!
//! Every request the toolbar sees gets its own diagnostic session: the
//! configured panels collect timing, headers, request variables, executed
//! queries, rendered templates, log messages and span timings, and the
//! rendered toolbar is injected into HTML responses.
//!
//! - SQL query inspection with duplicate, slow and N+1 markers, and signed
//!   select/explain replay links
//! - Redirect interception
//! - Gzip-aware body rewriting
//! - Template editor for recently rendered templates
//! - Profiler built on `tracing` spans
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use reinhardt_debug_toolbar::{CaptureLayer, DebugToolbarLayer, ToolbarConfig};
//! use tower::Layer;
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(CaptureLayer::new())
//!     .init();
//!
//! let toolbar = DebugToolbarLayer::new(ToolbarConfig::new("dev-secret"))?;
//! let app = toolbar.layer(Router::new().route("/", get(index)));
//! ```
//!
//! Handlers report queries, templates and request globals through the
//! request's [`Recorder`], which is also an axum extractor:
//!
//! ```rust,ignore
//! async fn index(recorder: Recorder) -> Html<String> {
//!     let started = Instant::now();
//!     let rows = db.fetch("SELECT * FROM users WHERE active = ?", [true]).await;
//!     recorder.record_query(
//!         "SELECT * FROM users WHERE active = ?",
//!         json!([true]),
//!         started.elapsed(),
//!     );
//!     // ...
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **Middleware Layer**: [`DebugToolbarLayer`] wraps the application and
//!    serves the toolbar's own routes under `/_debug_toolbar/`
//! 2. **Session Layer**: one [`ToolbarSession`] per request, kept in a
//!    [`RequestSessionStore`] for as long as the request runs
//! 3. **Panel Layer**: panels resolved through the [`PanelRegistry`]
//! 4. **UI Layer**: Tera templates and the [`ResponseRewriter`]

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

// Module declarations following Rust 2024 module system (no mod.rs)
pub mod capture;
pub mod context;
pub mod error;
pub mod middleware;
pub mod panels;
pub mod rewrite;
pub mod session;
pub mod signing;
pub mod store;
pub mod ui;
pub mod utils;
pub mod views;

// Re-export main types
pub use capture::{CaptureLayer, Recorder};
pub use context::{QueryExecutor, QueryOutput, RequestInfo, ResponseInfo, RouteInfo, ToolbarServices};
pub use error::{SigningError, ToolbarError, ToolbarResult};
pub use middleware::{DebugToolbarBuilder, DebugToolbarLayer, DebugToolbarService, ToolbarConfig};
pub use panels::{Panel, PanelDescriptor, PanelInit, PanelRegistry, ViewHandler};
pub use rewrite::ResponseRewriter;
pub use session::ToolbarSession;
pub use signing::QuerySigner;
pub use store::{RequestId, RequestSessionStore};
pub use ui::ToolbarTemplates;
