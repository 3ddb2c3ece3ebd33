//! Identity provider user identifier.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid [`AuthUid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid auth uid: {0}")]
pub struct AuthUidError(String);

/// The identity provider's identifier for an account.
///
/// This is the uniqueness key of the `usuarios` table (`auth_uid` column):
/// at most one profile row exists per identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUid(Uuid);

impl AuthUid {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identifier.
    ///
    /// Only useful for tests and fakes; real identifiers are issued by the
    /// identity provider.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AuthUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuthUid {
    type Err = AuthUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AuthUidError(s.to_owned()))
    }
}

impl From<Uuid> for AuthUid {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_display() {
        let raw = "0b6f3a2e-8c1d-4f7a-9e55-3d2c1b0a9f88";
        let uid: AuthUid = raw.parse().unwrap();
        assert_eq!(uid.to_string(), raw);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<AuthUid>().is_err());
    }

    #[test]
    fn test_serde_is_plain_string() {
        let uid: AuthUid = "0b6f3a2e-8c1d-4f7a-9e55-3d2c1b0a9f88".parse().unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"0b6f3a2e-8c1d-4f7a-9e55-3d2c1b0a9f88\"");
    }
}
