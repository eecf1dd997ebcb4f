use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::BlobStore;
use crate::error::{ChatError, ChatResult};

/// In-memory blob storage for tests and local development. Can be switched
/// into a failing mode to exercise the upload-abort path.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (Bytes, String)>>,
    fail_uploads: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, payload: Bytes, content_type: &str) -> ChatResult<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ChatError::UploadFailed("simulated transport error".into()));
        }
        let mut guard = self.objects.write().await;
        guard.insert(key.to_string(), (payload, content_type.to_string()));
        Ok(format!("memory://{key}"))
    }
}
