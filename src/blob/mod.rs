//! Blob storage for attachment payloads.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ChatResult;

pub mod memory;
pub mod s3;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the payload under `key` and returns the stable public URL the
    /// attachment reference will carry. Errors surface as `UploadFailed`.
    async fn put(&self, key: &str, payload: Bytes, content_type: &str) -> ChatResult<String>;
}
