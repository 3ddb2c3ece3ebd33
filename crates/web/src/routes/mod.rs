//! HTTP route handlers for Colibrí.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Sign-in page
//! POST /login                  - Sign-in action (rate limited)
//! POST /logout                 - Sign-out action
//!
//! # Registration
//! GET  /register               - Registration page (current flow state)
//! POST /register/send          - Step 1: send verification email (rate limited)
//! POST /register/validate      - Step 2: check the email was confirmed (rate limited)
//! POST /register/profile       - Step 3: create the profile row (rate limited)
//! POST /register/reset         - Start the registration over
//!
//! # Shell panels (requires auth)
//! GET  /home                   - Summary with metric cards
//! GET  /upload                 - Order upload placeholder
//! GET  /tickets                - Tickets placeholder
//! GET  /alistamiento           - Staging placeholder
//! GET  /serializacion          - Serialization placeholder
//! GET  /facturas               - Invoices placeholder
//! ```
//!
//! Panels accept `?via=menu` (navigation notice) and `?drawer=open`.

pub mod auth;
pub mod panels;
pub mod register;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::error::AppError;
use crate::middleware::credential_rate_limiter;
use crate::state::AppState;

/// Create the routes that accept credentials, behind the rate limiter.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register/send", post(register::send))
        .route("/register/validate", post(register::validate))
        .route("/register/profile", post(register::profile))
        .layer(credential_rate_limiter())
}

/// Create the registration page routes.
pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register::register_page))
        .route("/register/reset", post(register::reset))
}

/// Create the shell panel routes.
pub fn panel_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(panels::home))
        .route("/upload", get(panels::upload))
        .route("/tickets", get(panels::tickets))
        .route("/alistamiento", get(panels::alistamiento))
        .route("/serializacion", get(panels::serializacion))
        .route("/facturas", get(panels::facturas))
}

/// Create all routes for the web front-end.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Sign-in page
        .route("/", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(credential_routes())
        .merge(register_routes())
        .merge(panel_routes())
        .fallback(not_found)
}

/// Fallback for paths without a route.
async fn not_found(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "no route");
    AppError::NotFound(uri.path().to_owned())
}
