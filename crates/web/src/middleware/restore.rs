//! Session restore from the persisted token pair.
//!
//! The first request of a server-side session that arrives with token
//! cookies refreshes them with the identity provider. New tokens replace
//! the cookies; if the account has a profile row it is cached, which
//! authenticates the session. Rejected tokens are deleted. Restore never
//! fails the request.
//!
//! `/login` and `/logout` write the token cookies themselves and are passed
//! through untouched, so each response carries a single cookie delta.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use tower_sessions::Session;

use colibri_core::UserProfile;

use crate::error::set_sentry_user;
use crate::middleware::set_current_user;
use crate::models::session_keys;
use crate::services::{CookieTokenStore, RestoreOutcome, TokenStore};
use crate::state::AppState;

/// Routes whose handlers own the token cookies.
const TOKEN_ROUTES: &[&str] = &["/login", "/logout"];

/// Restore a session from token cookies, once per server-side session.
pub async fn restore_session_middleware(
    State(state): State<AppState>,
    session: Session,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    if manages_tokens(request.uri().path()) || !needs_restore(&session).await {
        return next.run(request).await;
    }

    let mut store = CookieTokenStore::new(jar, state.config().is_secure());
    if store.load().is_none() {
        return next.run(request).await;
    }

    match state.auth().restore_session(&mut store).await {
        RestoreOutcome::Restored(Some(profile)) => cache_profile(&session, &profile).await,
        RestoreOutcome::Restored(None) => {
            tracing::info!("tokens refreshed but account has no profile row yet");
        }
        RestoreOutcome::Cleared | RestoreOutcome::NoTokens => {}
    }

    if let Err(e) = session.insert(session_keys::RESTORE_ATTEMPTED, true).await {
        tracing::error!(error = %e, "failed to mark session restore");
    }

    let response = next.run(request).await;
    (store.into_jar(), response).into_response()
}

fn manages_tokens(path: &str) -> bool {
    TOKEN_ROUTES.contains(&path)
}

async fn needs_restore(session: &Session) -> bool {
    let attempted = session
        .get::<bool>(session_keys::RESTORE_ATTEMPTED)
        .await
        .ok()
        .flatten()
        .unwrap_or(false);
    if attempted {
        return false;
    }

    let signed_in = session
        .get::<UserProfile>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .is_some();
    !signed_in
}

async fn cache_profile(session: &Session, profile: &UserProfile) {
    match set_current_user(session, profile).await {
        Ok(()) => set_sentry_user(&profile.auth_uid, Some(profile.email.as_str())),
        Err(e) => tracing::error!(error = %e, "failed to cache restored profile"),
    }
}
