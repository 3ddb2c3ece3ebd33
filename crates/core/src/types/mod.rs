//! Core types for Colibrí.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod profile;
pub mod registration;
pub mod token;

pub use email::{Email, EmailError};
pub use id::{AuthUid, AuthUidError};
pub use profile::{Role, UserProfile};
pub use registration::{RegistrationField, RegistrationForm, RegistrationState, ValidationError};
pub use token::{AccessToken, RefreshToken, TokenPair};
