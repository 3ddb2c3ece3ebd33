//! Session middleware configuration.
//!
//! Server-side sessions hold the cached profile, the registration flow in
//! progress and pending notices. They live in memory and end with the
//! browser session; the durable part of a login is the token pair in the
//! encrypted cookies.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ColibriConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "colibri_session";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &ColibriConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnSessionEnd)
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
