//! The three-step registration flow.
//!
//! `Editing → EmailSent → EmailConfirmed → ProfileCreated`
//!
//! 1. Validate the form and create the account; the provider emails a
//!    confirmation link.
//! 2. Sign in with the entered password. The provider refuses until the link
//!    has been clicked, which is how confirmation is detected.
//! 3. Insert the profile row using the identifier captured in step 2.
//!
//! A failed step leaves the state unchanged so the user can retry it.
//! Accounts created in step 1 are never rolled back.
//!
//! The flow is serializable and lives in the server-side session between
//! requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use colibri_core::{
    AccessToken, AuthUid, Email, RegistrationForm, RegistrationState, Role, UserProfile,
    ValidationError,
};

use super::{AuthError, AuthService, IdentityProvider, ProfileStore};
use crate::supabase::{ErrorKind, SupabaseError};

/// Errors from a registration step. The `Display` text is shown to the user.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The form failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Account creation failed.
    #[error(transparent)]
    SignUp(#[from] AuthError),

    /// The confirmation link has not been clicked yet.
    #[error("Aún no confirmas el correo.")]
    NotConfirmed,

    /// The confirmation sign-in failed for another reason.
    #[error("{0}")]
    Confirmation(#[source] SupabaseError),

    /// The profile row could not be written.
    #[error("{0}")]
    ProfileWrite(#[source] SupabaseError),

    /// The step is not enabled in the current state.
    #[error("Paso de registro no disponible ({0})")]
    OutOfOrder(RegistrationState),
}

/// Account captured by a successful confirmation, consumed by step 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub auth_uid: AuthUid,
    /// Token of the confirmation sign-in; the profile insert runs as this
    /// user.
    pub access_token: AccessToken,
}

/// A registration in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFlow {
    state: RegistrationState,
    email: Option<Email>,
    display_name: String,
    seller_code: String,
    draft: Option<RegistrationDraft>,
}

impl RegistrationFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> RegistrationState {
        self.state
    }

    /// Email the account was created with (after step 1).
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn seller_code(&self) -> &str {
        &self.seller_code
    }

    #[must_use]
    pub const fn draft(&self) -> Option<&RegistrationDraft> {
        self.draft.as_ref()
    }

    /// Step 1: validate the form and create the account.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Validation` if a field is empty, the
    /// passwords differ or the email is malformed.
    /// Returns `RegistrationError::SignUp` if the provider refuses the
    /// account (`AuthError::AlreadyRegistered` for a duplicate email).
    #[instrument(skip_all)]
    pub async fn send_verification<P, S>(
        &mut self,
        auth: &AuthService<'_, P, S>,
        form: &RegistrationForm,
    ) -> Result<(), RegistrationError>
    where
        P: IdentityProvider,
        S: ProfileStore,
    {
        self.require(self.state.can_send_email())?;

        let email = form.validate()?;
        auth.sign_up(&email, &form.password).await?;

        info!(email = %email, "verification email sent");
        self.email = Some(email);
        self.display_name = form.display_name.trim().to_owned();
        self.seller_code = form.seller_code.trim().to_owned();
        self.state = RegistrationState::EmailSent;
        Ok(())
    }

    /// Step 2: check that the email has been confirmed by signing in.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::NotConfirmed` while the confirmation link
    /// has not been clicked; the flow stays at `EmailSent`.
    /// Returns `RegistrationError::Confirmation` with the provider's message
    /// for any other failure.
    #[instrument(skip_all)]
    pub async fn confirm_email<P, S>(
        &mut self,
        auth: &AuthService<'_, P, S>,
        password: &str,
    ) -> Result<(), RegistrationError>
    where
        P: IdentityProvider,
        S: ProfileStore,
    {
        self.require(self.state.can_confirm_email())?;
        let email = self
            .email
            .as_ref()
            .ok_or(RegistrationError::OutOfOrder(self.state))?;

        let session = match auth.provider().sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) if e.kind() == ErrorKind::EmailNotConfirmed => {
                info!(email = %email, "email not confirmed yet");
                return Err(RegistrationError::NotConfirmed);
            }
            Err(e) => {
                warn!(email = %email, error = %e, "confirmation sign-in failed");
                return Err(RegistrationError::Confirmation(e));
            }
        };

        info!(auth_uid = %session.user.id, "email confirmed");
        self.draft = Some(RegistrationDraft {
            auth_uid: session.user.id,
            access_token: AccessToken::new(session.access_token),
        });
        self.state = RegistrationState::EmailConfirmed;
        Ok(())
    }

    /// Step 3: create the profile row.
    ///
    /// The row is inserted; if one already exists for the account (a retry
    /// after a lost response, or a sign-in in between), it is upserted with
    /// the entered details instead, so the account ends up with one row.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::ProfileWrite` with the store's message if
    /// the row cannot be written; the flow stays at `EmailConfirmed`.
    #[instrument(skip_all)]
    pub async fn create_profile<P, S>(
        &mut self,
        auth: &AuthService<'_, P, S>,
    ) -> Result<UserProfile, RegistrationError>
    where
        P: IdentityProvider,
        S: ProfileStore,
    {
        self.require(self.state.can_create_profile())?;
        let (Some(email), Some(draft)) = (&self.email, &self.draft) else {
            return Err(RegistrationError::OutOfOrder(self.state));
        };

        let profile = UserProfile {
            auth_uid: draft.auth_uid,
            email: email.clone(),
            display_name: self.display_name.clone(),
            seller_code: self.seller_code.clone(),
            role: Role::default(),
        };

        let stored = match auth.profiles().insert(&draft.access_token, &profile).await {
            Ok(stored) => stored,
            Err(e) if e.kind() == ErrorKind::Conflict => {
                info!(auth_uid = %profile.auth_uid, "profile row exists, upserting");
                auth.profiles()
                    .upsert(&draft.access_token, &profile)
                    .await
                    .map_err(RegistrationError::ProfileWrite)?
            }
            Err(e) => {
                error!(auth_uid = %profile.auth_uid, error = %e, "profile insert failed");
                return Err(RegistrationError::ProfileWrite(e));
            }
        };

        info!(auth_uid = %stored.auth_uid, "profile created");
        self.draft = None;
        self.state = RegistrationState::ProfileCreated;
        Ok(stored)
    }

    /// Start over from `Editing`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn require(&self, enabled: bool) -> Result<(), RegistrationError> {
        if enabled {
            Ok(())
        } else {
            Err(RegistrationError::OutOfOrder(self.state))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colibri_core::RegistrationField;

    use super::*;
    use crate::services::fakes::{FakeProfiles, FakeProvider};

    const EMAIL: &str = "new.user@example.com";
    const PASSWORD: &str = "Secret123";

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: EMAIL.to_owned(),
            display_name: "Nueva Usuaria".to_owned(),
            seller_code: "V42".to_owned(),
            password: PASSWORD.to_owned(),
            password_confirm: PASSWORD.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_full_registration_scenario() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();

        flow.send_verification(&auth, &form()).await.unwrap();
        assert_eq!(flow.state(), RegistrationState::EmailSent);

        let err = flow.confirm_email(&auth, PASSWORD).await.unwrap_err();
        assert!(matches!(err, RegistrationError::NotConfirmed));
        assert_eq!(flow.state(), RegistrationState::EmailSent);
        assert!(flow.draft().is_none());

        provider.confirm(EMAIL);
        flow.confirm_email(&auth, PASSWORD).await.unwrap();
        assert_eq!(flow.state(), RegistrationState::EmailConfirmed);
        let uid = provider.uid_of(EMAIL).unwrap();
        assert_eq!(flow.draft().unwrap().auth_uid, uid);

        let profile = flow.create_profile(&auth).await.unwrap();
        assert_eq!(flow.state(), RegistrationState::ProfileCreated);
        assert!(flow.draft().is_none());

        assert_eq!(profile.auth_uid, uid);
        assert_eq!(profile.email.as_str(), EMAIL);
        assert_eq!(profile.display_name, "Nueva Usuaria");
        assert_eq!(profile.seller_code, "V42");
        assert_eq!(profile.role, Role::Vendedor);
        assert_eq!(profiles.rows_for(uid), vec![profile]);
    }

    #[tokio::test]
    async fn test_invalid_form_never_leaves_editing() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();

        let mut blank_seller = form();
        blank_seller.seller_code = "   ".to_owned();
        let err = flow.send_verification(&auth, &blank_seller).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation(ValidationError::EmptyField(
                RegistrationField::SellerCode
            ))
        ));

        let mut mismatch = form();
        mismatch.password_confirm = "Secret124".to_owned();
        let err = flow.send_verification(&auth, &mismatch).await.unwrap_err();
        assert_eq!(err.to_string(), "Las contraseñas no coinciden");

        assert_eq!(flow.state(), RegistrationState::Editing);
        assert_eq!(provider.account_count(), 0);
    }

    #[tokio::test]
    async fn test_already_registered_keeps_state() {
        let provider = FakeProvider::new();
        provider.add_account(EMAIL, PASSWORD, true);
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();

        let err = flow.send_verification(&auth, &form()).await.unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::SignUp(AuthError::AlreadyRegistered)
        ));
        assert_eq!(err.to_string(), "Usuario ya registrado");
        assert_eq!(flow.state(), RegistrationState::Editing);
        assert!(flow.email().is_none());
    }

    #[tokio::test]
    async fn test_steps_reject_running_out_of_order() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();

        let err = flow.confirm_email(&auth, PASSWORD).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::OutOfOrder(RegistrationState::Editing)
        ));
        let err = flow.create_profile(&auth).await.unwrap_err();
        assert!(matches!(err, RegistrationError::OutOfOrder(_)));

        flow.send_verification(&auth, &form()).await.unwrap();
        let err = flow.send_verification(&auth, &form()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::OutOfOrder(RegistrationState::EmailSent)
        ));
        assert_eq!(flow.state(), RegistrationState::EmailSent);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_on_confirmation_is_shown_verbatim() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();
        flow.send_verification(&auth, &form()).await.unwrap();
        provider.confirm(EMAIL);

        let err = flow.confirm_email(&auth, "wrong").await.unwrap_err();

        assert!(matches!(err, RegistrationError::Confirmation(_)));
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(flow.state(), RegistrationState::EmailSent);
    }

    #[tokio::test]
    async fn test_failed_profile_write_is_retryable() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();
        flow.send_verification(&auth, &form()).await.unwrap();
        provider.confirm(EMAIL);
        flow.confirm_email(&auth, PASSWORD).await.unwrap();

        profiles.set_writes_fail(true);
        let err = flow.create_profile(&auth).await.unwrap_err();
        assert!(matches!(err, RegistrationError::ProfileWrite(_)));
        assert_eq!(flow.state(), RegistrationState::EmailConfirmed);
        assert!(flow.draft().is_some());

        profiles.set_writes_fail(false);
        flow.create_profile(&auth).await.unwrap();
        assert_eq!(flow.state(), RegistrationState::ProfileCreated);
        assert_eq!(profiles.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_row_is_overwritten_not_duplicated() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();
        flow.send_verification(&auth, &form()).await.unwrap();
        provider.confirm(EMAIL);

        // A plain sign-in in between creates the default row.
        auth.sign_in(EMAIL, PASSWORD).await.unwrap();
        let uid = provider.uid_of(EMAIL).unwrap();
        assert_eq!(profiles.rows_for(uid)[0].display_name, "new.user");

        flow.confirm_email(&auth, PASSWORD).await.unwrap();
        flow.create_profile(&auth).await.unwrap();

        let rows = profiles.rows_for(uid);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "Nueva Usuaria");
        assert_eq!(rows[0].seller_code, "V42");
    }

    #[tokio::test]
    async fn test_reset_and_session_round_trip() {
        let provider = FakeProvider::new();
        let profiles = FakeProfiles::new();
        let auth = AuthService::new(&provider, &profiles);
        let mut flow = RegistrationFlow::new();
        flow.send_verification(&auth, &form()).await.unwrap();

        let json = serde_json::to_value(&flow).unwrap();
        let restored: RegistrationFlow = serde_json::from_value(json).unwrap();
        assert_eq!(restored, flow);
        assert_eq!(restored.display_name(), "Nueva Usuaria");
        assert_eq!(restored.seller_code(), "V42");

        flow.reset();
        assert_eq!(flow, RegistrationFlow::new());
    }
}
