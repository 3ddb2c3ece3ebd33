//! Integration tests for Colibrí.
//!
//! These run against a live server connected to a real Supabase project,
//! so every test is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server
//! cargo run -p colibri-web
//!
//! # Run integration tests
//! COLIBRI_TEST_EMAIL=... COLIBRI_TEST_PASSWORD=... \
//!     cargo test -p colibri-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `COLIBRI_TEST_URL` - Server under test (default: `http://127.0.0.1:8550`)
//! - `COLIBRI_TEST_EMAIL` / `COLIBRI_TEST_PASSWORD` - A confirmed account
//!   with a profile row, for the sign-in tests

use colibri_core::Email;
use reqwest::{Client, Response, StatusCode, header};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("COLIBRI_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8550".to_string())
}

/// Credentials of the prepared test account, if configured.
#[must_use]
pub fn test_account() -> Option<(String, String)> {
    let email = std::env::var("COLIBRI_TEST_EMAIL").ok()?;
    let password = std::env::var("COLIBRI_TEST_PASSWORD").ok()?;
    Some((email, password))
}

/// A fresh address that no account uses yet.
///
/// # Panics
///
/// Panics if the generated address does not parse, which would be a bug in
/// this helper.
#[must_use]
pub fn unique_email() -> Email {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    Email::parse(&format!("colibri-test+{tag}@example.com")).expect("generated email is valid")
}

/// HTTP client that keeps cookies and does not follow redirects, so tests
/// can assert on `Location`.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Target of a redirect response.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Submit the sign-in form.
///
/// # Errors
///
/// Returns the transport error if the server is unreachable.
pub async fn sign_in(client: &Client, email: &str, password: &str) -> reqwest::Result<Response> {
    client
        .post(format!("{}/login", base_url()))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
}

/// Whether a response is the redirect to the sign-in page.
#[must_use]
pub fn is_sign_in_redirect(response: &Response) -> bool {
    response.status() == StatusCode::SEE_OTHER && location(response) == Some("/")
}
