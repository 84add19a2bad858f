use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a user in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier for the user, assigned on creation.
    pub id: Option<UserId>,
    /// The user's first name.
    pub first: String,
    /// The user's last name.
    pub last: String,
    /// The user's email address.
    pub email: String,
}
