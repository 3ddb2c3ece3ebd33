//! Session token types.
//!
//! Tokens are opaque strings issued by the identity provider. They are kept
//! as plain strings so they can live in the server-side session and in
//! encrypted cookies, but their `Debug` output is redacted so they never end
//! up in logs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Short-lived bearer token for identity provider and data store calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

/// Long-lived token used to obtain a new [`AccessToken`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

macro_rules! opaque_token {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw token string.
            #[must_use]
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Expose the raw token value.
            #[must_use]
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

opaque_token!(AccessToken);
opaque_token!(RefreshToken);

/// Access + refresh token pair issued together by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl TokenPair {
    /// Build a pair from raw token strings.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
        }
    }
}
