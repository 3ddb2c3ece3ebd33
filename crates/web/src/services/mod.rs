//! Business logic services for Colibrí.
//!
//! # Services
//!
//! - `auth` - Sign-in, sign-up, session restore and sign-out
//! - `registration` - The three-step registration flow
//! - `tokens` - Persistence of the access/refresh token pair
//!
//! Services talk to the outside world only through the traits below, so
//! tests can drive them with in-memory fakes instead of a live Supabase
//! project.

pub mod auth;
pub mod registration;
pub mod tokens;

#[cfg(test)]
pub(crate) mod fakes;

pub use auth::{AuthError, AuthService, RestoreOutcome, SignedIn};
pub use registration::{RegistrationDraft, RegistrationError, RegistrationFlow};
pub use tokens::{CookieTokenStore, MemoryTokenStore, TokenStore};

use std::future::Future;

use colibri_core::{AccessToken, AuthUid, Email, RefreshToken, UserProfile};

use crate::supabase::{AuthSession, SignUpOutcome, SupabaseError};

/// Identity provider operations (Supabase Auth).
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email/password pair for a session.
    fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, SupabaseError>> + Send;

    /// Create an account; the provider emails a confirmation link.
    fn sign_up(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<SignUpOutcome, SupabaseError>> + Send;

    /// Exchange a refresh token for a new session.
    fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> impl Future<Output = Result<AuthSession, SupabaseError>> + Send;

    /// Revoke the session the access token belongs to.
    fn sign_out(
        &self,
        access_token: &AccessToken,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;
}

/// Profile row operations on the `usuarios` table.
///
/// Every call is made on behalf of a signed-in user and carries that user's
/// access token.
pub trait ProfileStore: Send + Sync {
    /// Fetch the row for an account, if any.
    fn find_by_auth_uid(
        &self,
        access_token: &AccessToken,
        auth_uid: AuthUid,
    ) -> impl Future<Output = Result<Option<UserProfile>, SupabaseError>> + Send;

    /// Insert a new row. Fails with a conflict if the account already has one.
    fn insert(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, SupabaseError>> + Send;

    /// Insert a row, or overwrite the existing row with the same `auth_uid`.
    fn upsert(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, SupabaseError>> + Send;
}
