//! Authentication service.
//!
//! Wraps the identity provider and the profile table: password sign-in
//! (creating the profile row on first sign-in), sign-up, restoring a
//! session from persisted tokens, and sign-out.

mod error;

pub use error::AuthError;

use tracing::{info, instrument, warn};

use colibri_core::{AuthUid, Email, TokenPair, UserProfile};

use super::{IdentityProvider, ProfileStore, TokenStore};
use crate::supabase::{ErrorKind, SignUpOutcome};

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub profile: UserProfile,
    pub tokens: TokenPair,
}

/// What [`AuthService::restore_session`] did with the persisted tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No token pair was stored.
    NoTokens,
    /// The pair was refreshed and the new one stored. Carries the account's
    /// profile row when it has one.
    Restored(Option<UserProfile>),
    /// The pair was rejected and has been removed.
    Cleared,
}

/// Authentication service.
pub struct AuthService<'a, P, S> {
    provider: &'a P,
    profiles: &'a S,
}

impl<'a, P, S> AuthService<'a, P, S>
where
    P: IdentityProvider,
    S: ProfileStore,
{
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(provider: &'a P, profiles: &'a S) -> Self {
        Self { provider, profiles }
    }

    /// The identity provider this service signs in with.
    #[must_use]
    pub const fn provider(&self) -> &'a P {
        self.provider
    }

    /// The profile table this service reads and writes.
    #[must_use]
    pub const fn profiles(&self) -> &'a S {
        self.profiles
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// The email is normalized before it is sent. When the account has no
    /// profile row yet, a default one is upserted on `auth_uid`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the provider rejects the
    /// sign-in for any reason, including an unconfirmed email.
    /// Returns `AuthError::ProfileRead`/`ProfileWrite` if the profile row
    /// cannot be read or created.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = Email::parse(email).map_err(|e| {
            warn!(error = %e, "sign-in with malformed email");
            AuthError::InvalidCredentials
        })?;

        let session = self
            .provider
            .sign_in_with_password(&email, password)
            .await
            .map_err(|e| {
                warn!(email = %email, error = %e, "identity provider rejected sign-in");
                AuthError::InvalidCredentials
            })?;

        let tokens = session.tokens();
        let profile = self
            .get_or_create_profile(&tokens, session.user.id, &email)
            .await?;

        info!(auth_uid = %profile.auth_uid, "signed in");
        Ok(SignedIn { profile, tokens })
    }

    /// Register a new account. The provider emails a confirmation link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyRegistered` if the email has an account.
    /// Returns `AuthError::Provider` with the provider's message otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<SignUpOutcome, AuthError> {
        let outcome = self
            .provider
            .sign_up(email, password)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::UserAlreadyExists => AuthError::AlreadyRegistered,
                _ => AuthError::Provider(e),
            })?;

        info!(auth_uid = %outcome.user_id, pending = outcome.pending, "account created");
        Ok(outcome)
    }

    async fn get_or_create_profile(
        &self,
        tokens: &TokenPair,
        auth_uid: AuthUid,
        email: &Email,
    ) -> Result<UserProfile, AuthError> {
        let existing = self
            .profiles
            .find_by_auth_uid(&tokens.access_token, auth_uid)
            .await
            .map_err(AuthError::ProfileRead)?;

        if let Some(profile) = existing {
            return Ok(profile);
        }

        info!(auth_uid = %auth_uid, "first sign-in, creating profile row");
        let profile = UserProfile::default_for(auth_uid, email);
        self.profiles
            .upsert(&tokens.access_token, &profile)
            .await
            .map_err(AuthError::ProfileWrite)
    }

    // =========================================================================
    // Persisted Sessions
    // =========================================================================

    /// Restore a session from the persisted token pair.
    ///
    /// The refresh token is exchanged for a new pair, which replaces the
    /// stored one, and the account's existing profile row is looked up.
    /// Any failure removes the stored tokens; this never fails.
    pub async fn restore_session<T: TokenStore>(&self, store: &mut T) -> RestoreOutcome {
        let Some(stored) = store.load() else {
            return RestoreOutcome::NoTokens;
        };

        let session = match self.provider.refresh_session(&stored.refresh_token).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "stored tokens rejected, clearing them");
                store.clear();
                return RestoreOutcome::Cleared;
            }
        };

        let tokens = session.tokens();
        store.save(&tokens);

        match self
            .profiles
            .find_by_auth_uid(&tokens.access_token, session.user.id)
            .await
        {
            Ok(profile) => {
                info!(
                    auth_uid = %session.user.id,
                    has_profile = profile.is_some(),
                    "session restored from stored tokens"
                );
                RestoreOutcome::Restored(profile)
            }
            Err(e) => {
                warn!(error = %e, "profile lookup failed during restore, clearing tokens");
                store.clear();
                RestoreOutcome::Cleared
            }
        }
    }

    /// Sign out: forget the stored tokens, then revoke the session with the
    /// provider. Provider failures are logged and otherwise ignored.
    pub async fn sign_out<T: TokenStore>(&self, store: &mut T) {
        let previous = store.load();
        store.clear();

        let Some(tokens) = previous else {
            return;
        };

        if let Err(e) = self.provider.sign_out(&tokens.access_token).await {
            warn!(error = %e, "sign_out failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colibri_core::Role;

    use super::*;
    use crate::services::MemoryTokenStore;
    use crate::services::fakes::{FakeProfiles, FakeProvider};

    const EMAIL: &str = "new.user@example.com";
    const PASSWORD: &str = "Secret123";

    #[tokio::test]
    async fn test_sign_in_returns_profile_of_provider_user() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let existing = UserProfile {
            auth_uid: uid,
            email: Email::parse(EMAIL).unwrap(),
            display_name: "Nueva Usuaria".to_owned(),
            seller_code: "V42".to_owned(),
            role: Role::default(),
        };
        let profiles = FakeProfiles::with_row(existing.clone());
        let auth = AuthService::new(&provider, &profiles);

        let signed_in = auth.sign_in(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(signed_in.profile, existing);
        assert_eq!(signed_in.profile.auth_uid, uid);
        assert_eq!(profiles.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_default_profile() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let signed_in = auth.sign_in(EMAIL, PASSWORD).await.unwrap();

        let rows = profiles.rows_for(uid);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "new.user");
        assert_eq!(rows[0].seller_code, "");
        assert_eq!(rows[0].role, Role::Vendedor);
        assert_eq!(signed_in.profile, rows[0]);
    }

    #[tokio::test]
    async fn test_repeated_sign_in_never_duplicates_rows() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        auth.sign_in(EMAIL, PASSWORD).await.unwrap();
        auth.sign_in(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(profiles.rows_for(uid).len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_normalizes_email() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let signed_in = auth
            .sign_in("  New.User@Example.COM ", PASSWORD)
            .await
            .unwrap();

        assert_eq!(signed_in.profile.auth_uid, uid);
        assert_eq!(signed_in.profile.email.as_str(), EMAIL);
    }

    #[tokio::test]
    async fn test_sign_in_rejections_are_invalid_credentials() {
        let provider = FakeProvider::new();
        provider.add_account(EMAIL, PASSWORD, false);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let unconfirmed = auth.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(unconfirmed, AuthError::InvalidCredentials));

        let wrong_password = auth.sign_in(EMAIL, "nope").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert_eq!(
            wrong_password.to_string(),
            "Credenciales inválidas o e-mail sin confirmar"
        );

        let malformed = auth.sign_in("not-an-email", PASSWORD).await.unwrap_err();
        assert!(matches!(malformed, AuthError::InvalidCredentials));

        assert!(profiles.rows().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_profile_write_failure() {
        let provider = FakeProvider::new();
        provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        profiles.set_writes_fail(true);
        let auth = AuthService::new(&provider, &profiles);

        let err = auth.sign_in(EMAIL, PASSWORD).await.unwrap_err();

        assert!(matches!(err, AuthError::ProfileWrite(_)));
        assert!(err.to_string().contains("row-level security"));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_is_already_registered() {
        let provider = FakeProvider::new();
        provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let err = auth
            .sign_up(&Email::parse(EMAIL).unwrap(), PASSWORD)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AlreadyRegistered));
        assert_eq!(err.to_string(), "Usuario ya registrado");
    }

    #[tokio::test]
    async fn test_sign_up_is_pending_confirmation() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let outcome = auth
            .sign_up(&Email::parse(EMAIL).unwrap(), PASSWORD)
            .await
            .unwrap();

        assert!(outcome.pending);
        assert_eq!(provider.uid_of(EMAIL), Some(outcome.user_id));
    }

    #[tokio::test]
    async fn test_sign_up_passes_other_errors_through() {
        let provider = FakeProvider::new();
        provider.go_offline();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);

        let err = auth
            .sign_up(&Email::parse(EMAIL).unwrap(), PASSWORD)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_restore_without_tokens_does_nothing() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut store = MemoryTokenStore::new();

        assert_eq!(auth.restore_session(&mut store).await, RestoreOutcome::NoTokens);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_rotates_tokens_and_finds_profile() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let signed_in = auth.sign_in(EMAIL, PASSWORD).await.unwrap();
        let mut store = MemoryTokenStore::with_tokens(&signed_in.tokens);

        let outcome = auth.restore_session(&mut store).await;

        let RestoreOutcome::Restored(Some(profile)) = outcome else {
            panic!("expected a restored profile, got {outcome:?}");
        };
        assert_eq!(profile.auth_uid, uid);
        let stored = store.load().unwrap();
        assert_ne!(stored, signed_in.tokens);
    }

    #[tokio::test]
    async fn test_restore_with_rejected_tokens_clears_store() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut store = MemoryTokenStore::with_tokens(&TokenPair::new("stale", "revoked"));

        assert_eq!(auth.restore_session(&mut store).await, RestoreOutcome::Cleared);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_clears_store_when_profile_lookup_fails() {
        let provider = FakeProvider::new();
        let uid = provider.add_account(EMAIL, PASSWORD, true);
        let session = provider.issue_session(uid, EMAIL);
        let profiles = FakeProfiles::new();
        profiles.set_reads_fail(true);
        let auth = AuthService::new(&provider, &profiles);
        let mut store = MemoryTokenStore::with_tokens(&session.tokens());

        assert_eq!(auth.restore_session(&mut store).await, RestoreOutcome::Cleared);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_then_restore_never_authenticates() {
        let provider = FakeProvider::new();
        provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let signed_in = auth.sign_in(EMAIL, PASSWORD).await.unwrap();
        let mut store = MemoryTokenStore::with_tokens(&signed_in.tokens);

        auth.sign_out(&mut store).await;

        assert!(store.is_empty());
        assert_eq!(
            provider.signed_out(),
            vec![signed_in.tokens.access_token.expose().to_owned()]
        );
        assert_eq!(auth.restore_session(&mut store).await, RestoreOutcome::NoTokens);
    }

    #[tokio::test]
    async fn test_sign_out_ignores_provider_failure() {
        let provider = FakeProvider::new();
        provider.fail_sign_out();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut store = MemoryTokenStore::with_tokens(&TokenPair::new("a", "r"));

        auth.sign_out(&mut store).await;

        assert!(store.is_empty());
        assert!(provider.signed_out().is_empty());
    }
}
