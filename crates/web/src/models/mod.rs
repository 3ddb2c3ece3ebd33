//! Types stored in the server-side session.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeLevel};
pub use session::keys as session_keys;
