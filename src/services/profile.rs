//! Profile lookup seam.
//!
//! The send path uses this opportunistically to refresh the sender's cached
//! snapshot on the conversation document; a miss or failure never blocks a
//! send.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{ChatError, ChatResult};
use crate::models::conversation::{DisplayInfo, UserId};

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn display_info(&self, user: &UserId) -> ChatResult<DisplayInfo>;
}

/// Fixed in-memory profile table for tests and local development.
#[derive(Default)]
pub struct StaticProfiles {
    profiles: RwLock<HashMap<UserId, DisplayInfo>>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserId, info: DisplayInfo) {
        self.profiles.write().await.insert(user, info);
    }
}

#[async_trait]
impl ProfileDirectory for StaticProfiles {
    async fn display_info(&self, user: &UserId) -> ChatResult<DisplayInfo> {
        self.profiles
            .read()
            .await
            .get(user)
            .cloned()
            .ok_or_else(|| ChatError::Store(format!("no profile for {user}")))
    }
}
