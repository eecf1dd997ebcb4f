//! Push-notification dispatch seam.
//!
//! One dispatcher is built at process start and injected into sessions; the
//! send path fires it after a successful commit and ignores failures beyond
//! logging them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ChatResult;
use crate::models::conversation::UserId;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(
        &self,
        recipient_id: &UserId,
        title: &str,
        body: &str,
        payload: Value,
    ) -> ChatResult<()>;
}

/// Dispatcher for deployments without a push provider configured.
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn notify(
        &self,
        _recipient_id: &UserId,
        _title: &str,
        _body: &str,
        _payload: Value,
    ) -> ChatResult<()> {
        Ok(())
    }
}

/// Logs the dispatch instead of delivering it; default in tests and local
/// development.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn notify(
        &self,
        recipient_id: &UserId,
        title: &str,
        body: &str,
        payload: Value,
    ) -> ChatResult<()> {
        tracing::info!(recipient = %recipient_id, %title, %body, %payload, "push dispatch");
        Ok(())
    }
}
