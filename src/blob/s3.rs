use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::sync::Arc;

use super::BlobStore;
use crate::config::Config;
use crate::error::{ChatError, ChatResult};

/// S3-backed blob storage for attachment payloads.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Arc<Client>,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    pub async fn from_env(cfg: &Config) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self {
            client: Arc::new(Client::new(&aws_config)),
            bucket: cfg.attachment_bucket.clone(),
            base_url: cfg.attachment_base_url.clone(),
        }
    }

    pub fn with_client(client: Arc<Client>, bucket: String, base_url: String) -> Self {
        Self {
            client,
            bucket,
            base_url,
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, payload: Bytes, content_type: &str) -> ChatResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|e| ChatError::UploadFailed(e.to_string()))?;

        Ok(self.public_url(key))
    }
}
