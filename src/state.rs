use std::sync::Arc;

use crate::blob::{memory::MemoryBlobStore, BlobStore};
use crate::config::Config;
use crate::services::notification::{LogDispatcher, NotificationDispatcher};
use crate::services::profile::{ProfileDirectory, StaticProfiles};
use crate::store::{memory::MemoryStore, DocumentStore};

/// Process-wide collaborators, built once at startup and injected into every
/// session. Nothing in here is ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        profiles: Arc<dyn ProfileDirectory>,
        config: Config,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
            profiles,
            config: Arc::new(config),
        }
    }

    /// Fully in-memory state: memory store and blob storage, log-only push
    /// dispatch, static profiles. The backend tests run against.
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            MemoryStore::new(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(LogDispatcher),
            Arc::new(StaticProfiles::new()),
            config,
        )
    }
}
