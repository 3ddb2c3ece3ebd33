//! Route guard extractors.
//!
//! A session is authenticated when it holds the signed-in user's profile
//! (cached at sign-in or by session restore).

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use colibri_core::UserProfile;

use crate::models::session_keys;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_PATH: &str = "/";

/// Extractor that requires a signed-in user.
///
/// Without one the request is redirected to the sign-in page and the
/// handler never runs.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireProfile(user): RequireProfile,
/// ) -> impl IntoResponse {
///     format!("Hola, {}!", user.display_name)
/// }
/// ```
pub struct RequireProfile(pub UserProfile);

/// Rejection of [`RequireProfile`].
pub struct RedirectToSignIn;

impl IntoResponse for RedirectToSignIn {
    fn into_response(self) -> Response {
        Redirect::to(SIGN_IN_PATH).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireProfile
where
    S: Send + Sync,
{
    type Rejection = RedirectToSignIn;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalProfile(profile) = OptionalProfile::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalProfile(None));

        match profile {
            Some(profile) => Ok(Self(profile)),
            None => {
                tracing::info!(path = %parts.uri.path(), "protected route without session");
                Err(RedirectToSignIn)
            }
        }
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalProfile(pub Option<UserProfile>);

impl<S> FromRequestParts<S> for OptionalProfile
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let profile = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<UserProfile>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(profile))
    }
}

/// Cache the signed-in user's profile in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    profile: &UserProfile,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, profile).await
}
