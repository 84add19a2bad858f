use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Store-assigned identifier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents one authenticated login.
///
/// `encrypted_credentials` is opaque: it is produced and consumed outside this
/// crate and never inspected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Assigned once by the store on first save.
    pub id: Option<SessionId>,
    /// Opaque, already-encrypted credential blob.
    pub encrypted_credentials: Vec<u8>,
    /// Idle-expiry clock. Moved by extensions.
    pub expires_at: DateTime<Utc>,
    /// Absolute ceiling. Never changes after creation.
    pub end_of_life: DateTime<Utc>,
}

impl Session {
    /// Builds an unsaved session starting at `now`.
    ///
    /// Timestamps are truncated to microseconds, the resolution of
    /// `TIMESTAMPTZ`, so a saved session loads back unchanged.
    pub fn new(
        encrypted_credentials: Vec<u8>,
        now: DateTime<Utc>,
        idle_timeout: Duration,
        max_lifetime: Duration,
    ) -> Self {
        Self {
            id: None,
            encrypted_credentials,
            expires_at: deadline(now, idle_timeout).trunc_subsecs(6),
            end_of_life: deadline(now, max_lifetime).trunc_subsecs(6),
        }
    }

    /// Whether a store has assigned this session an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// A session is reclaimable once either clock has passed. Extending
    /// `expires_at` never outruns `end_of_life`.
    pub fn is_reclaimable(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at || now >= self.end_of_life
    }
}

/// Longest distance any session clock may be set ahead of now (100 years).
/// Both stores clamp to it.
pub const MAX_LIFESPAN: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Clamps `lifespan` to [`MAX_LIFESPAN`].
pub fn clamp_lifespan(lifespan: Duration) -> Duration {
    lifespan.min(MAX_LIFESPAN)
}

/// `from + after`, with `after` clamped to [`MAX_LIFESPAN`] and the result
/// saturating at the latest representable instant.
pub fn deadline(from: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(clamp_lifespan(after))
        .ok()
        .and_then(|d| from.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
