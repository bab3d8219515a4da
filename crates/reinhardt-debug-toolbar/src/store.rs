//! Per-request session store
//!
//! Sessions are keyed by a [`RequestId`] minted for every request the toolbar
//! handles, never by anything taken from the request itself. The
//! [`SessionGuard`] returned by [`RequestSessionStore::create`] removes the
//! entry when dropped, which covers normal completion, errors, panics and
//! cancelled request futures alike.

use crate::session::ToolbarSession;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
	/// Mint a fresh identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for RequestId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for RequestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

/// Shared handle to a session.
pub type SessionHandle = Arc<Mutex<ToolbarSession>>;

/// In-flight sessions of the toolbar.
#[derive(Debug, Default)]
pub struct RequestSessionStore {
	sessions: RwLock<HashMap<RequestId, SessionHandle>>,
}

impl RequestSessionStore {
	/// Create an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a session; the returned guard owns its lifetime.
	pub fn create(self: &Arc<Self>, session: ToolbarSession) -> SessionGuard {
		let id = session.request_id();
		let handle = Arc::new(Mutex::new(session));
		self.sessions.write().insert(id, handle.clone());
		tracing::debug!(request_id = %id, "debug toolbar session created");
		SessionGuard {
			store: Arc::clone(self),
			id,
			handle,
		}
	}

	/// Session of an in-flight request.
	pub fn get(&self, id: RequestId) -> Option<SessionHandle> {
		self.sessions.read().get(&id).cloned()
	}

	/// Remove a session; removing an absent id is a no-op.
	pub fn remove(&self, id: RequestId) -> Option<SessionHandle> {
		self.sessions.write().remove(&id)
	}

	/// Number of in-flight sessions
	pub fn len(&self) -> usize {
		self.sessions.read().len()
	}

	/// Whether no session is in flight
	pub fn is_empty(&self) -> bool {
		self.sessions.read().is_empty()
	}
}

/// Removes its session from the store when dropped.
#[derive(Debug)]
pub struct SessionGuard {
	store: Arc<RequestSessionStore>,
	id: RequestId,
	handle: SessionHandle,
}

impl SessionGuard {
	/// Request the guarded session belongs to
	pub fn id(&self) -> RequestId {
		self.id
	}

	/// The guarded session
	pub fn session(&self) -> &SessionHandle {
		&self.handle
	}
}

impl Drop for SessionGuard {
	fn drop(&mut self) {
		self.store.remove(self.id);
		tracing::debug!(request_id = %self.id, "debug toolbar session removed");
	}
}
