//! Error types for configuration, identity and persistence.

use thiserror::Error;

/// Startup configuration problems. Fatal: reported once, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("could not load remote store configuration: {0}")]
    Fetch(String),
}

/// Failure reported by the identity provider, keyed by provider error code.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self.code.as_str() {
            "auth/unauthorized-domain" => "Unauthorized domain.",
            "auth/credential-already-in-use" => "That account is already in use.",
            "auth/popup-closed-by-user" => "The sign-in window was closed.",
            "auth/invalid-credential" => "Invalid sign-in details.",
            _ => "There was an error signing in.",
        }
    }
}

/// Errors from the key-value and document substrates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("change feed closed")]
    FeedClosed,
}

/// A backend failed to save, delete or load.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("local storage failure: {0}")]
    Local(#[source] StoreError),

    #[error("remote storage failure: {0}")]
    Remote(#[source] StoreError),

    #[error("stored data is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Bulk copy of guest data into the signed-in user's remote storage failed.
/// Local data is kept whenever this is returned.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("could not read local data: {0}")]
    Read(#[source] PersistenceError),

    #[error("{failed} of {attempted} writes failed; local data kept for a later retry")]
    Partial { failed: usize, attempted: usize },

    #[error("data copied but local storage could not be cleared: {0}")]
    Clear(#[source] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_auth_codes_map_to_specific_messages() {
        assert_eq!(
            AuthError::new("auth/popup-closed-by-user", "closed").user_message(),
            "The sign-in window was closed."
        );
        assert_eq!(
            AuthError::new("auth/credential-already-in-use", "x").user_message(),
            "That account is already in use."
        );
    }

    #[test]
    fn unknown_auth_codes_fall_back_to_generic_message() {
        assert_eq!(
            AuthError::new("auth/network-request-failed", "offline").user_message(),
            "There was an error signing in."
        );
    }

    #[test]
    fn partial_migration_mentions_retry() {
        let err = MigrationError::Partial { failed: 1, attempted: 2 };
        assert_eq!(
            err.to_string(),
            "1 of 2 writes failed; local data kept for a later retry"
        );
    }
}
