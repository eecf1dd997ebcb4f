use dotenvy::dotenv;
use std::env;

/// Default live-subscription window. History beyond it is not paginated.
pub const DEFAULT_MESSAGE_WINDOW: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of most-recent messages a live subscription re-emits.
    pub message_window: usize,
    /// Bucket holding chat attachment blobs.
    pub attachment_bucket: String,
    /// Public base URL attachment references are built from (CDN domain).
    pub attachment_base_url: String,
    pub aws_region: String,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::ChatError> {
        dotenv().ok();

        let message_window = env::var("CHAT_MESSAGE_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MESSAGE_WINDOW);
        if message_window == 0 {
            return Err(crate::error::ChatError::Config(
                "CHAT_MESSAGE_WINDOW must be positive".into(),
            ));
        }

        let attachment_bucket =
            env::var("CHAT_ATTACHMENT_BUCKET").unwrap_or_else(|_| "chat-media".into());
        let attachment_base_url = env::var("CHAT_MEDIA_BASE_URL")
            .unwrap_or_else(|_| format!("https://{attachment_bucket}.s3.amazonaws.com"));
        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());

        Ok(Self {
            message_window,
            attachment_bucket,
            attachment_base_url,
            aws_region,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            message_window: DEFAULT_MESSAGE_WINDOW,
            attachment_bucket: "chat-media-test".into(),
            attachment_base_url: "https://chat-media-test.s3.amazonaws.com".into(),
            aws_region: "us-east-1".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_the_standard_window() {
        let cfg = Config::test_defaults();
        assert_eq!(cfg.message_window, 50);
        assert!(!cfg.attachment_bucket.is_empty());
    }
}
