#![allow(dead_code)]

use std::sync::Arc;

use chat_core::blob::memory::MemoryBlobStore;
use chat_core::models::conversation::DisplayInfo;
use chat_core::services::notification::LogDispatcher;
use chat_core::services::profile::StaticProfiles;
use chat_core::store::memory::MemoryStore;
use chat_core::{AppState, ChatSession, Config, UserId};

pub struct TestHarness {
    pub state: AppState,
    pub blobs: Arc<MemoryBlobStore>,
    pub profiles: Arc<StaticProfiles>,
}

pub fn harness() -> TestHarness {
    let blobs = Arc::new(MemoryBlobStore::new());
    let profiles = Arc::new(StaticProfiles::new());
    let state = AppState::new(
        MemoryStore::new(),
        blobs.clone(),
        Arc::new(LogDispatcher),
        profiles.clone(),
        Config::test_defaults(),
    );
    TestHarness {
        state,
        blobs,
        profiles,
    }
}

pub async fn open_session(state: &AppState, self_id: &str, peer_id: &str) -> ChatSession {
    let mut session = ChatSession::new(state.clone());
    session
        .open(UserId::from(self_id), UserId::from(peer_id))
        .await
        .expect("open session");
    session
}

pub fn profile(name: &str) -> DisplayInfo {
    DisplayInfo {
        display_name: name.to_string(),
        avatar_url: Some(format!("https://cdn.example/{name}.png")),
    }
}
