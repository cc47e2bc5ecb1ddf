use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Item with ID {id} not found in {resource}")]
    NotFound { resource: String, id: String },

    #[error("No seed data available for {0}")]
    SeedUnavailable(String),

    #[error("Cached value under {key} is corrupted: {reason}")]
    MalformedCache { key: String, reason: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Item with ID {id} already exists in {resource}")]
    DuplicateId { resource: String, id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid resource path: {0:?}")]
    InvalidResourcePath(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Event {0} is full")]
    EventFull(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential error: {0}")]
    Credential(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Maximum length of a corrupted value quoted back in error messages
const MAX_REASON_LENGTH: usize = 200;

impl StoreError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        StoreError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Build a `MalformedCache` error, truncating the parser message so a
    /// huge corrupted document does not end up in the logs.
    pub fn malformed(key: &str, reason: impl std::fmt::Display) -> Self {
        let reason = reason.to_string();
        let reason = if reason.len() <= MAX_REASON_LENGTH {
            reason
        } else {
            let cut: String = reason.chars().take(MAX_REASON_LENGTH).collect();
            format!("{}... (truncated)", cut)
        };
        StoreError::MalformedCache {
            key: key.to_string(),
            reason,
        }
    }

    /// True for errors that mean the caller must sign in first
    pub fn is_auth_error(&self) -> bool {
        matches!(self, StoreError::AuthRequired | StoreError::InvalidCredentials)
    }
}
