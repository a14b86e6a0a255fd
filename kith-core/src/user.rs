//! User profile and session types.
//!
//! Sign-in itself is delegated to whatever identity provider fronts a
//! deployment; kith only consumes identities. A `Session` is the opaque
//! bearer capability handed to clients once identity is established.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub home_location: Option<String>,
}

/// A minted bearer session resolving to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
