//! One-shot notices carried in the session from a POST to the page it
//! redirects to.

use tower_sessions::Session;

use crate::models::{Notice, session_keys};

/// Queue a notice for the next rendered page, replacing any pending one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_notice(
    session: &Session,
    notice: Notice,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::NOTICE, notice).await
}

/// Remove and return the pending notice.
///
/// A session failure only costs the notice, so it is logged, not returned.
pub async fn take_notice(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(session_keys::NOTICE)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to read pending notice");
            None
        })
}
