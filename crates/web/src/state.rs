//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use secrecy::ExposeSecret;

use crate::config::ColibriConfig;
use crate::services::AuthService;
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the Supabase client and the cookie encryption key.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ColibriConfig,
    supabase: SupabaseClient,
    cookie_key: Key,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The cookie key is derived from `COLIBRI_COOKIE_SECRET` when set
    /// (validated to be at least 32 bytes), otherwise generated randomly.
    #[must_use]
    pub fn new(config: ColibriConfig) -> Self {
        let supabase = SupabaseClient::new(&config.supabase);
        let cookie_key = config.cookie_secret.as_ref().map_or_else(
            || {
                tracing::warn!(
                    "COLIBRI_COOKIE_SECRET not set, stored sessions will not survive a restart"
                );
                Key::generate()
            },
            |secret| Key::derive_from(secret.expose_secret().as_bytes()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                cookie_key,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ColibriConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Authentication service backed by the Supabase client.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, SupabaseClient, SupabaseClient> {
        AuthService::new(&self.inner.supabase, &self.inner.supabase)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.inner.cookie_key.clone()
    }
}
