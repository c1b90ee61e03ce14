//! Connection registry and per-session protocol state.

use crate::rpc::JsonRpcResponse;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Lifecycle state of one protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Stream is open but the `initialize` handshake has not completed.
    Uninitialized,

    /// Handshake complete; all methods are available.
    Initialized,
}

/// Mutable handshake state guarded by the connection's lock.
#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    client_info: Option<Value>,
}

/// One streaming session.
///
/// The registry and dispatch tasks share the connection via `Arc`; the
/// receiver half of the outbound queue is owned exclusively by the
/// session's transport loop.
#[derive(Debug)]
pub struct Connection {
    /// Session ID, stable for the connection's lifetime.
    pub id: String,

    /// Creation time.
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Insertion order, used to resolve the most recent connection.
    seq: u64,

    outbound: mpsc::UnboundedSender<JsonRpcResponse>,
    lifecycle: Mutex<Lifecycle>,
}

impl Connection {
    /// Queue an envelope for delivery on this session's event stream.
    ///
    /// Returns false when the stream side has already shut down; the
    /// envelope is dropped in that case.
    pub fn push(&self, envelope: JsonRpcResponse) -> bool {
        if self.outbound.send(envelope).is_err() {
            debug!("Dropped envelope for closed session: {}", self.id);
            return false;
        }
        true
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lifecycle.lock().state
    }

    /// Whether the `initialize` handshake has completed.
    pub fn is_initialized(&self) -> bool {
        self.state() == SessionState::Initialized
    }

    /// Record the handshake: store client info and mark the session
    /// Initialized. Re-invocation replaces the stored client info and
    /// leaves the state Initialized.
    pub fn initialize(&self, client_info: Option<Value>) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = SessionState::Initialized;
        lifecycle.client_info = client_info;
    }

    /// Client metadata recorded during `initialize`, if any.
    pub fn client_info(&self) -> Option<Value> {
        self.lifecycle.lock().client_info.clone()
    }
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<String, Arc<Connection>>,
    next_seq: u64,
}

/// Process-wide table of live sessions.
///
/// All operations take one synchronous mutex so that `remove` stays
/// callable from `Drop` on any exit path of a transport loop.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new session, returning the shared handle
    /// and the receiver half of its outbound queue.
    pub fn create(&self) -> (Arc<Connection>, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        inner.next_seq += 1;
        let connection = Arc::new(Connection {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now(),
            seq: inner.next_seq,
            outbound: tx,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Uninitialized,
                client_info: None,
            }),
        });
        inner
            .connections
            .insert(connection.id.clone(), connection.clone());
        (connection, rx)
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.inner.lock().connections.get(id).cloned()
    }

    /// The most recently created session, if any.
    pub fn most_recent(&self) -> Option<Arc<Connection>> {
        self.inner
            .lock()
            .connections
            .values()
            .max_by_key(|c| c.seq)
            .cloned()
    }

    /// Remove a session. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        self.inner.lock().connections.remove(id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes a session from the registry when dropped.
///
/// Owned by the session's transport loop so teardown runs on every exit
/// path: normal end, transport error, or cancellation.
pub struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: String,
}

impl ConnectionGuard {
    /// Tie a session's registration to this guard's lifetime.
    pub fn new(registry: Arc<ConnectionRegistry>, id: impl Into<String>) -> Self {
        Self {
            registry,
            id: id.into(),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(connection) = self.registry.remove(&self.id) {
            let open_secs = (chrono::Utc::now() - connection.created_at).num_seconds();
            info!("SSE session closed: {} (open {}s)", self.id, open_secs);
        }
    }
}
