//! Session-related types.
//!
//! The signed-in user is cached in the session as a [`UserProfile`] under
//! [`keys::CURRENT_USER`]; its presence is what makes a session
//! authenticated.
//!
//! [`UserProfile`]: colibri_core::UserProfile

/// Session keys.
pub mod keys {
    /// Profile of the signed-in user.
    pub const CURRENT_USER: &str = "user_data";

    /// Registration flow in progress.
    pub const REGISTRATION: &str = "registration_flow";

    /// One-shot notice shown by the next rendered page.
    pub const NOTICE: &str = "notice";

    /// Set once persisted tokens have been checked for this session.
    pub const RESTORE_ATTEMPTED: &str = "session_restore_attempted";
}
