//! One-shot notices ("flash messages").

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a notice, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

impl NoticeLevel {
    /// CSS modifier / wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    /// Error notice. The message gets the "❌ " prefix errors are shown with.
    #[must_use]
    pub fn error(message: impl fmt::Display) -> Self {
        Self::new(NoticeLevel::Error, format!("❌ {message}"))
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_notice_is_prefixed() {
        let notice = Notice::error("Usuario ya registrado");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "❌ Usuario ya registrado");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Notice::warning("x")).unwrap();
        assert_eq!(json, r#"{"level":"warning","message":"x"}"#);
    }
}
