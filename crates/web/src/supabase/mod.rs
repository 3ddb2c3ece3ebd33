//! Supabase Auth (GoTrue) and REST (PostgREST) clients.
//!
//! # Architecture
//!
//! - One cloneable [`SupabaseClient`] shares a `reqwest::Client` and the
//!   project URL/anon key between both APIs
//! - The client is stateless: calls made on behalf of a signed-in user take
//!   that user's access token explicitly instead of mutating a "current
//!   session" inside the client
//! - Supabase is the source of truth for accounts and profiles; nothing is
//!   cached locally
//!
//! # APIs
//!
//! ## Auth (`/auth/v1`)
//! - Password sign-in, sign-up (sends the confirmation email), token refresh,
//!   sign-out, health
//!
//! ## REST (`/rest/v1`)
//! - `usuarios` table: select by `auth_uid`, insert, upsert on `auth_uid`

mod auth;
mod rest;
pub mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use colibri_core::AccessToken;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed (network, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("{message}")]
    Api {
        status: u16,
        /// Structured error code (`error_code` from Auth, `code` from REST).
        code: Option<String>,
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A write that should return the written row returned nothing.
    #[error("empty response from {0}")]
    EmptyResponse(&'static str),
}

/// Coarse classification of a [`SupabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong email/password.
    InvalidCredentials,
    /// The account exists but its email has not been confirmed yet.
    EmailNotConfirmed,
    /// Sign-up for an email that already has an account.
    UserAlreadyExists,
    /// Unique constraint violation in the data store.
    Conflict,
    Other,
}

impl SupabaseError {
    /// Classify the error.
    ///
    /// Structured codes are used when the service sends them. Older
    /// deployments only return prose, so the known messages are matched as
    /// a fallback.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        let Self::Api {
            status,
            code,
            message,
        } = self
        else {
            return ErrorKind::Other;
        };

        match code.as_deref() {
            Some("email_not_confirmed") => return ErrorKind::EmailNotConfirmed,
            Some("user_already_exists" | "email_exists") => {
                return ErrorKind::UserAlreadyExists;
            }
            Some("invalid_credentials" | "invalid_grant") => {
                // `invalid_grant` also carries "Email not confirmed" on old servers
                if !message.contains("Email not confirmed") {
                    return ErrorKind::InvalidCredentials;
                }
            }
            Some("23505") => return ErrorKind::Conflict,
            _ => {}
        }

        if message.contains("Email not confirmed") {
            ErrorKind::EmailNotConfirmed
        } else if message.contains("User already registered") {
            ErrorKind::UserAlreadyExists
        } else if message.contains("Invalid login credentials") {
            ErrorKind::InvalidCredentials
        } else if *status == 409 {
            ErrorKind::Conflict
        } else {
            ErrorKind::Other
        }
    }
}

/// Every error body shape Supabase services emit.
///
/// - Auth: `{"code": 400, "error_code": "...", "msg": "..."}`
/// - Auth (legacy): `{"error": "invalid_grant", "error_description": "..."}`
/// - REST: `{"code": "23505", "message": "...", "details": "...", "hint": null}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn into_error(self, status: u16) -> SupabaseError {
        let code = self.error_code.or_else(|| match self.code {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        });
        let code = code.or_else(|| self.error.clone());

        let message = self
            .msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("request failed with status {status}"));

        SupabaseError::Api {
            status,
            code,
            message,
        }
    }
}

/// Turn a non-success response into [`SupabaseError::Api`], or pass it through.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
        message: (!text.trim().is_empty()).then(|| text.trim().to_string()),
        ..ErrorBody::default()
    });

    Err(body.into_error(status.as_u16()))
}

/// Client for a hosted Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.clone(),
                anon_key: config.anon_key.expose_secret().to_string(),
            }),
        }
    }

    /// Build an endpoint URL below the project base URL.
    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        let mut base = self.inner.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Start a request carrying the project key and the given bearer token
    /// (the anon key when no user token is supplied).
    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        bearer: Option<&AccessToken>,
    ) -> reqwest::RequestBuilder {
        let bearer = bearer.map_or(self.inner.anon_key.as_str(), AccessToken::expose);
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer)
    }
}
