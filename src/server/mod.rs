//! Reference HTTP content server.
//!
//! It speaks the same protocol the remote backend expects and keeps its
//! content in a zero-latency mock backend over [`LocalStorage`], so the
//! remote path can be exercised end to end without an external service.

pub mod router;
pub mod sessions;

pub use router::{router, serve, ErrorBody};
pub use sessions::Sessions;

use std::sync::Arc;
use std::time::Duration;

use crate::engine::LocalStorage;
use crate::mock::MockBackend;

/// Shared state behind the server's routes.
pub struct ServerState {
    pub storage: Arc<LocalStorage>,
    pub content: MockBackend,
    pub sessions: Arc<Sessions>,
}

impl ServerState {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self {
            content: MockBackend::new(storage.clone(), Duration::ZERO),
            sessions: Arc::new(Sessions::new(storage.clone())),
            storage,
        }
    }
}
