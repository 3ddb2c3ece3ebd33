//! Wire types returned by Supabase Auth.

use serde::Deserialize;

use colibri_core::{AuthUid, TokenPair};

/// Account record of the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: AuthUid,
    pub email: Option<String>,
    pub email_confirmed_at: Option<String>,
}

/// Session issued on sign-in or refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    /// Unix timestamp (seconds) at which the access token expires.
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// The token pair to persist for this session.
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Body of a sign-up response.
///
/// When email confirmation is required the provider returns the bare user;
/// when accounts are auto-confirmed it returns a full session.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

/// Result of a successful sign-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_id: AuthUid,
    /// `true` when the account must be confirmed through the emailed link
    /// before it can sign in.
    pub pending: bool,
}

impl From<SignUpResponse> for SignUpOutcome {
    fn from(response: SignUpResponse) -> Self {
        match response {
            SignUpResponse::Session(session) => Self {
                user_id: session.user.id,
                pending: false,
            },
            SignUpResponse::User(user) => Self {
                user_id: user.id,
                pending: user.email_confirmed_at.is_none(),
            },
        }
    }
}
