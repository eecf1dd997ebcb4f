pub mod blob;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ChatError, ChatResult};
pub use models::conversation::{Conversation, ConversationId, DisplayInfo, UserId};
pub use models::message::{AttachmentRef, Message};
pub use services::chat_session::{ChatSession, SessionState};
pub use services::directory::ConversationDirectory;
pub use state::AppState;
