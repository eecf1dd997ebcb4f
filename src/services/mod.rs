pub mod attachment;
pub mod chat_session;
pub mod directory;
pub mod identity;
pub mod message_log;
pub mod notification;
pub mod profile;
pub mod unread;
