//! Authentication error types.

use thiserror::Error;

use crate::supabase::SupabaseError;

/// Errors that can occur during authentication operations.
///
/// The `Display` text is what the user is shown.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the credentials, or the email is not confirmed.
    #[error("Credenciales inválidas o e-mail sin confirmar")]
    InvalidCredentials,

    /// Sign-up for an email that already has an account.
    #[error("Usuario ya registrado")]
    AlreadyRegistered,

    /// Any other identity provider failure, shown verbatim.
    #[error("{0}")]
    Provider(#[source] SupabaseError),

    /// Reading the profile row failed.
    #[error("{0}")]
    ProfileRead(#[source] SupabaseError),

    /// Writing the profile row failed.
    #[error("{0}")]
    ProfileWrite(#[source] SupabaseError),
}
