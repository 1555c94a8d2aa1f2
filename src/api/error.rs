//! Error taxonomy for catalog calls
//!
//! These never cross the public engine boundary: `KtuvitClient` logs them and
//! turns them into empty results or failed outcomes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KtuvitError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Protocol(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Encryption salt not found")]
    SaltNotFound,

    #[error("Password encryption failed")]
    Encryption,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidId(String),

    #[error("Background runtime failed: {0}")]
    Runtime(String),
}

impl KtuvitError {
    /// Message for outcome reasons. Transport errors name their root cause
    /// (timeout, refused connection) instead of only the failed URL.
    pub fn reason(&self) -> String {
        match self {
            KtuvitError::Network(e) if e.is_timeout() => "request timed out".to_string(),
            KtuvitError::Network(e) => {
                let mut message = self.to_string();
                let mut source = std::error::Error::source(e);
                while let Some(cause) = source {
                    message = format!("{}: {}", message, cause);
                    source = std::error::Error::source(cause);
                }
                message
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KtuvitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_of_non_network_errors_is_display() {
        assert_eq!(KtuvitError::SaltNotFound.reason(), "Encryption salt not found");
        assert_eq!(KtuvitError::Status(503).reason(), "Unexpected HTTP status 503");
    }

    #[tokio::test]
    async fn test_reason_names_connection_cause() {
        // Nothing listens on port 9 locally
        let err = reqwest::get("http://127.0.0.1:9/").await.unwrap_err();
        let reason = KtuvitError::from(err).reason();
        assert!(reason.starts_with("Request failed: "));
        assert!(reason.matches(": ").count() >= 2, "no cause in: {}", reason);
    }
}
