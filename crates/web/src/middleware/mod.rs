//! HTTP middleware stack for Colibrí.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame denial, no-store)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Session restore (token cookies → cached profile)
//! 7. Rate limiting (governor, credential routes only)

pub mod auth;
pub mod notice;
pub mod rate_limit;
pub mod request_id;
pub mod restore;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalProfile, RequireProfile, SIGN_IN_PATH, set_current_user};
pub use notice::{set_notice, take_notice};
pub use rate_limit::credential_rate_limiter;
pub use request_id::request_id_middleware;
pub use restore::restore_session_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
