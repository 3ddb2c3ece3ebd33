//! Durable storage of the session token pair.
//!
//! The browser keeps the pair in two encrypted cookies named after the keys
//! below; [`MemoryTokenStore`] is the in-process equivalent used in tests.

use std::collections::HashMap;

use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use colibri_core::TokenPair;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// How long the token cookies outlive the browser session.
const TOKEN_COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Get/set/clear access to the persisted token pair.
pub trait TokenStore: Send {
    /// The stored pair, if both tokens are present and non-empty.
    fn load(&self) -> Option<TokenPair>;

    /// Overwrite the stored pair.
    fn save(&mut self, tokens: &TokenPair);

    /// Remove both tokens.
    fn clear(&mut self);
}

/// Token store backed by the request's encrypted cookie jar.
///
/// Changes only reach the browser once the jar returned by
/// [`CookieTokenStore::into_jar`] is part of the response.
pub struct CookieTokenStore {
    jar: PrivateCookieJar,
    secure: bool,
}

impl CookieTokenStore {
    /// Wrap a cookie jar. `secure` marks the cookies HTTPS-only.
    #[must_use]
    pub const fn new(jar: PrivateCookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    /// Give back the jar with all changes applied.
    #[must_use]
    pub fn into_jar(self) -> PrivateCookieJar {
        self.jar
    }

    fn token_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(TOKEN_COOKIE_MAX_AGE_DAYS))
            .build()
    }
}

impl TokenStore for CookieTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let access = self.jar.get(ACCESS_TOKEN_KEY)?;
        let refresh = self.jar.get(REFRESH_TOKEN_KEY)?;

        if access.value().is_empty() || refresh.value().is_empty() {
            return None;
        }

        Some(TokenPair::new(access.value(), refresh.value()))
    }

    fn save(&mut self, tokens: &TokenPair) {
        let access = self.token_cookie(ACCESS_TOKEN_KEY, tokens.access_token.expose().to_owned());
        let refresh =
            self.token_cookie(REFRESH_TOKEN_KEY, tokens.refresh_token.expose().to_owned());
        self.jar = self.jar.clone().add(access).add(refresh);
    }

    fn clear(&mut self) {
        self.jar = self
            .jar
            .clone()
            .remove(Cookie::build(ACCESS_TOKEN_KEY).path("/"))
            .remove(Cookie::build(REFRESH_TOKEN_KEY).path("/"));
    }
}

/// Token store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `tokens`.
    #[must_use]
    pub fn with_tokens(tokens: &TokenPair) -> Self {
        let mut store = Self::new();
        store.save(tokens);
        store
    }

    /// Raw value under a storage key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let access = self.get(ACCESS_TOKEN_KEY).filter(|v| !v.is_empty())?;
        let refresh = self.get(REFRESH_TOKEN_KEY).filter(|v| !v.is_empty())?;
        Some(TokenPair::new(access, refresh))
    }

    fn save(&mut self, tokens: &TokenPair) {
        self.entries.insert(
            ACCESS_TOKEN_KEY.to_owned(),
            tokens.access_token.expose().to_owned(),
        );
        self.entries.insert(
            REFRESH_TOKEN_KEY.to_owned(),
            tokens.refresh_token.expose().to_owned(),
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
