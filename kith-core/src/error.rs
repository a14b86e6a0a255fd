//! Error types for the kith ecosystem.

use thiserror::Error;

/// Errors that can occur in kith operations.
#[derive(Error, Debug)]
pub enum KithError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Circle not found: {0}")]
    CircleNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Family member not found: {0}")]
    FamilyMemberNotFound(String),

    #[error("Invalid or already used invite token")]
    InvalidInvite,

    #[error("Not a member of circle '{0}'")]
    NotAMember(String),

    #[error("Only the circle owner can do that")]
    NotOwner,

    #[error("The circle owner cannot be removed from the circle")]
    OwnerRemoval,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for KithError {
    fn from(err: rusqlite::Error) -> Self {
        KithError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for KithError {
    fn from(err: serde_json::Error) -> Self {
        KithError::Serialization(err.to_string())
    }
}

/// Result type alias for kith operations.
pub type KithResult<T> = Result<T, KithError>;
