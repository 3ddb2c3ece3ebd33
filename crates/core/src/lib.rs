//! Colibrí Core - Shared domain types.
//!
//! This crate provides the types used by the Colibrí web front-end:
//! - identity values issued by the hosted identity provider (user ids, tokens)
//! - the application profile row stored in the `usuarios` table
//! - registration form validation and the registration flow states
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. This keeps the validation rules testable without a running
//! identity provider.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, ids, tokens, profiles and registration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
