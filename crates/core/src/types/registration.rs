//! Registration form validation and flow states.
//!
//! Registration happens in three steps, each triggered by the user:
//!
//! ```text
//! Editing --send verification--> EmailSent --confirm email--> EmailConfirmed
//!         --create profile--> ProfileCreated
//! ```
//!
//! Failed steps leave the state unchanged so they can be retried. Nothing
//! rolls back an external side effect of an earlier step: an account created
//! by the first step stays created.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{Email, EmailError};

/// A field of the registration form, in on-screen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationField {
    DisplayName,
    SellerCode,
    Email,
    Password,
    PasswordConfirm,
}

impl RegistrationField {
    /// Label shown next to the field.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DisplayName => "Nombre de usuario",
            Self::SellerCode => "Código de vendedor",
            Self::Email => "Correo",
            Self::Password => "Contraseña",
            Self::PasswordConfirm => "Confirmar contraseña",
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Client-side validation failures. These block the action and are fully
/// recoverable by editing the form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Completa todos los campos ({0})")]
    EmptyField(RegistrationField),
    #[error("Las contraseñas no coinciden")]
    PasswordMismatch,
    #[error("Correo inválido: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Values entered on the registration screen.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub email: String,
    #[serde(rename = "nombre_usuario")]
    pub display_name: String,
    #[serde(rename = "codigo_vendedor")]
    pub seller_code: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegistrationForm {
    /// Check that every field is filled in (whitespace does not count), that
    /// the password matches its confirmation, and that the email parses.
    ///
    /// Returns the normalized email on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking fields in
    /// on-screen order.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        let fields = [
            (RegistrationField::DisplayName, &self.display_name),
            (RegistrationField::SellerCode, &self.seller_code),
            (RegistrationField::Email, &self.email),
            (RegistrationField::Password, &self.password),
            (RegistrationField::PasswordConfirm, &self.password_confirm),
        ];

        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::EmptyField(*field));
        }

        if self.password != self.password_confirm {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(Email::parse(&self.email)?)
    }
}

/// Position of a registration in the three-step flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    #[default]
    Editing,
    EmailSent,
    EmailConfirmed,
    ProfileCreated,
}

impl RegistrationState {
    /// Whether the "send verification email" trigger is enabled.
    #[must_use]
    pub const fn can_send_email(self) -> bool {
        matches!(self, Self::Editing)
    }

    /// Whether the "validate email" trigger is enabled.
    #[must_use]
    pub const fn can_confirm_email(self) -> bool {
        matches!(self, Self::EmailSent)
    }

    /// Whether the "create profile" trigger is enabled.
    #[must_use]
    pub const fn can_create_profile(self) -> bool {
        matches!(self, Self::EmailConfirmed)
    }

    /// Whether the flow has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ProfileCreated)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Editing => "editing",
            Self::EmailSent => "email_sent",
            Self::EmailConfirmed => "email_confirmed",
            Self::ProfileCreated => "profile_created",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_form() -> RegistrationForm {
        RegistrationForm {
            email: "New.User@example.com".to_string(),
            display_name: "Nuevo Usuario".to_string(),
            seller_code: "V42".to_string(),
            password: "Secret123".to_string(),
            password_confirm: "Secret123".to_string(),
        }
    }

    #[test]
    fn test_valid_form_returns_normalized_email() {
        let email = filled_form().validate().unwrap();
        assert_eq!(email.as_str(), "new.user@example.com");
    }

    #[test]
    fn test_each_empty_field_is_rejected() {
        let cases: [(fn(&mut RegistrationForm), RegistrationField); 5] = [
            (|f| f.display_name.clear(), RegistrationField::DisplayName),
            (|f| f.seller_code.clear(), RegistrationField::SellerCode),
            (|f| f.email.clear(), RegistrationField::Email),
            (|f| f.password.clear(), RegistrationField::Password),
            (|f| f.password_confirm.clear(), RegistrationField::PasswordConfirm),
        ];

        for (clear, field) in cases {
            let mut form = filled_form();
            clear(&mut form);
            assert_eq!(form.validate(), Err(ValidationError::EmptyField(field)));
        }
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let mut form = filled_form();
        form.seller_code = "   ".to_string();
        assert_eq!(
            form.validate(),
            Err(ValidationError::EmptyField(RegistrationField::SellerCode))
        );
    }

    #[test]
    fn test_password_mismatch() {
        let mut form = filled_form();
        form.password_confirm = "Secret124".to_string();
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn test_malformed_email() {
        let mut form = filled_form();
        form.email = "sin-arroba".to_string();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::InvalidEmail(EmailError::MissingAtSymbol))
        ));
    }

    #[test]
    fn test_only_one_trigger_enabled_per_state() {
        let states = [
            RegistrationState::Editing,
            RegistrationState::EmailSent,
            RegistrationState::EmailConfirmed,
            RegistrationState::ProfileCreated,
        ];

        for state in states {
            let enabled = [
                state.can_send_email(),
                state.can_confirm_email(),
                state.can_create_profile(),
            ]
            .iter()
            .filter(|enabled| **enabled)
            .count();

            let expected = usize::from(!state.is_terminal());
            assert_eq!(enabled, expected, "state {state}");
        }
    }
}
