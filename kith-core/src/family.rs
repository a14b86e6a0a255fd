//! Family member roster types.

use serde::{Deserialize, Serialize};

/// A person on a circle's family roster. Not necessarily a kith user;
/// children and relatives without accounts are listed here too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub circle_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub relationship: String,
    /// URL of an externally stored photo, if one was uploaded
    pub photo_url: Option<String>,
}
