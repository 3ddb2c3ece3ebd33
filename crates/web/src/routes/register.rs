//! Registration route handlers.
//!
//! The page is one form with a submit button per step; each button posts to
//! its own endpoint and is only enabled in the state that allows it. The
//! [`RegistrationFlow`] lives in the server-side session between steps.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use colibri_core::{RegistrationForm, RegistrationState};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{SIGN_IN_PATH, set_notice, take_notice};
use crate::models::{Notice, session_keys};
use crate::services::{RegistrationError, RegistrationFlow};
use crate::state::AppState;

/// Path of the registration page.
pub const REGISTER_PATH: &str = "/register";

/// Step 2 form data. Only the password is read; the other fields of the
/// page are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateForm {
    #[serde(default)]
    pub password: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub notice: Option<Notice>,
    pub display_name: String,
    pub seller_code: String,
    pub email: String,
    pub state: RegistrationState,
}

impl RegisterTemplate {
    /// Page for a stored flow; fields show what the flow captured.
    fn for_flow(flow: &RegistrationFlow, notice: Option<Notice>) -> Self {
        Self {
            notice,
            display_name: flow.display_name().to_owned(),
            seller_code: flow.seller_code().to_owned(),
            email: flow.email().map(|e| e.as_str().to_owned()).unwrap_or_default(),
            state: flow.state(),
        }
    }

    /// Page re-rendered after a failed step 1, keeping what was typed.
    /// Passwords are never echoed back.
    fn for_form(form: &RegistrationForm, state: RegistrationState, notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            display_name: form.display_name.clone(),
            seller_code: form.seller_code.clone(),
            email: form.email.clone(),
            state,
        }
    }
}

async fn load_flow(session: &Session) -> Result<RegistrationFlow> {
    Ok(session
        .get::<RegistrationFlow>(session_keys::REGISTRATION)
        .await?
        .unwrap_or_default())
}

async fn save_flow(session: &Session, flow: &RegistrationFlow) -> Result<()> {
    session.insert(session_keys::REGISTRATION, flow).await?;
    Ok(())
}

/// Notice for a failed step. Form problems and an unconfirmed email are
/// warnings, provider failures are errors.
fn failure_notice(error: &RegistrationError) -> Notice {
    match error {
        RegistrationError::NotConfirmed => Notice::warning(format!("⚠️ {error}")),
        RegistrationError::Validation(_) => Notice::warning(error.to_string()),
        _ => Notice::error(error),
    }
}

/// Display the registration page.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn register_page(session: Session) -> Result<Response> {
    let flow = load_flow(&session).await?;
    let notice = take_notice(&session).await;
    Ok(RegisterTemplate::for_flow(&flow, notice).into_response())
}

/// Step 1: validate the form and send the verification email.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    let mut flow = load_flow(&session).await?;

    if let Err(e) = flow.send_verification(&state.auth(), &form).await {
        warn!(error = %e, "registration step 1 failed");
        let page = RegisterTemplate::for_form(&form, flow.state(), failure_notice(&e));
        return Ok(page.into_response());
    }

    save_flow(&session, &flow).await?;
    add_breadcrumb("registration", "verification email sent", None);
    set_notice(&session, Notice::success("📧 Revisa tu correo y confírmalo.")).await?;
    Ok(Redirect::to(REGISTER_PATH).into_response())
}

/// Step 2: check the email was confirmed by signing in with the password.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn validate(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ValidateForm>,
) -> Result<Response> {
    let mut flow = load_flow(&session).await?;

    let notice = match flow.confirm_email(&state.auth(), &form.password).await {
        Ok(()) => {
            save_flow(&session, &flow).await?;
            add_breadcrumb("registration", "email confirmed", None);
            Notice::success("✅ Correo confirmado. Ahora puedes registrar tu perfil.")
        }
        Err(e) => {
            info!(error = %e, state = %flow.state(), "registration step 2 not completed");
            failure_notice(&e)
        }
    };

    set_notice(&session, notice).await?;
    Ok(Redirect::to(REGISTER_PATH).into_response())
}

/// Step 3: create the profile row, then send the user to sign in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn profile(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut flow = load_flow(&session).await?;

    match flow.create_profile(&state.auth()).await {
        Ok(profile) => {
            session
                .remove::<RegistrationFlow>(session_keys::REGISTRATION)
                .await?;
            let auth_uid = profile.auth_uid.to_string();
            add_breadcrumb(
                "registration",
                "profile created",
                Some(&[("auth_uid", auth_uid.as_str())]),
            );
            set_notice(&session, Notice::success("✅ Perfil creado. Inicia sesión.")).await?;
            Ok(Redirect::to(SIGN_IN_PATH).into_response())
        }
        Err(e) => {
            warn!(error = %e, "registration step 3 failed");
            set_notice(&session, failure_notice(&e)).await?;
            Ok(Redirect::to(REGISTER_PATH).into_response())
        }
    }
}

/// Discard the registration in progress.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn reset(session: Session) -> Result<Response> {
    session
        .remove::<RegistrationFlow>(session_keys::REGISTRATION)
        .await?;
    Ok(Redirect::to(REGISTER_PATH).into_response())
}
