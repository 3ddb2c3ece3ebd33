//! Sign-in and sign-out route handlers.
//!
//! Sign-in goes through Supabase Auth's password grant. The token pair is
//! persisted in encrypted cookies and the profile row is cached in the
//! server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{SIGN_IN_PATH, set_current_user, set_notice, take_notice};
use crate::models::{Notice, session_keys};
use crate::services::{CookieTokenStore, SignedIn, TokenStore};
use crate::state::AppState;

use super::panels::Panel;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub notice: Option<Notice>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the sign-in page.
pub async fn login_page(session: Session) -> impl IntoResponse {
    LoginTemplate {
        notice: take_notice(&session).await,
    }
}

/// Handle sign-in form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if !form.is_complete() {
        set_notice(&session, Notice::warning("Completa todos los campos")).await?;
        return Ok(Redirect::to(SIGN_IN_PATH).into_response());
    }

    let SignedIn { profile, tokens } = match state.auth().sign_in(&form.email, &form.password).await
    {
        Ok(signed_in) => signed_in,
        Err(e) => {
            warn!(error = %e, "sign-in failed");
            set_notice(&session, Notice::error(&e)).await?;
            return Ok(Redirect::to(SIGN_IN_PATH).into_response());
        }
    };

    let mut store = CookieTokenStore::new(jar, state.config().is_secure());
    store.save(&tokens);

    // New identity, new session id
    session.cycle_id().await?;
    set_current_user(&session, &profile).await?;
    session.insert(session_keys::RESTORE_ATTEMPTED, true).await?;

    set_sentry_user(&profile.auth_uid, Some(profile.email.as_str()));
    add_breadcrumb("auth", "signed in", None);
    info!(auth_uid = %profile.auth_uid, "user signed in");

    set_notice(
        &session,
        Notice::success(format!("Bienvenido {}", profile.display_name)),
    )
    .await?;

    Ok((store.into_jar(), Redirect::to(Panel::Home.path())).into_response())
}

/// Handle sign-out.
///
/// Token cookies are removed before the provider is told, so the browser
/// ends up signed out even when Supabase is unreachable.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    jar: PrivateCookieJar,
) -> Result<Response> {
    let mut store = CookieTokenStore::new(jar, state.config().is_secure());
    state.auth().sign_out(&mut store).await;

    session.flush().await?;
    clear_sentry_user();
    add_breadcrumb("auth", "signed out", None);
    info!("user signed out");

    Ok((store.into_jar(), Redirect::to(SIGN_IN_PATH)).into_response())
}
