//! Streamer handle value object.

use std::fmt;

use crate::domain::foundation::ValidationError;

const MAX_HANDLE_LEN: usize = 24;

/// Validated handle of the broadcaster whose stream is relayed.
///
/// Accepts an optional leading `@` and surrounding whitespace. The remaining
/// text must be 1 to 24 characters of ASCII letters, digits, `.` or `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamerHandle(String);

impl StreamerHandle {
    /// Parses and validates a viewer-supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if handle.is_empty() {
            return Err(ValidationError::empty_field("identifier"));
        }
        if handle.chars().count() > MAX_HANDLE_LEN {
            return Err(ValidationError::invalid_format(
                "identifier",
                format!("longer than {} characters", MAX_HANDLE_LEN),
            ));
        }
        if let Some(bad) = handle
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
        {
            return Err(ValidationError::invalid_format(
                "identifier",
                format!("unexpected character '{}'", bad),
            ));
        }

        Ok(Self(handle.to_string()))
    }

    /// Returns the handle without the `@` prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_handle() {
        let handle = StreamerHandle::parse("alice_01.live").unwrap();
        assert_eq!(handle.as_str(), "alice_01.live");
    }

    #[test]
    fn strips_at_prefix_and_whitespace() {
        let handle = StreamerHandle::parse("  @alice ").unwrap();
        assert_eq!(handle.to_string(), "alice");
    }

    #[test]
    fn rejects_empty_and_bare_at() {
        assert!(matches!(
            StreamerHandle::parse("   "),
            Err(ValidationError::EmptyField { .. })
        ));
        assert!(matches!(
            StreamerHandle::parse("@"),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn rejects_path_characters() {
        let err = StreamerHandle::parse("alice/../admin").unwrap_err();
        assert!(err.to_string().contains("'/'"));
    }

    #[test]
    fn rejects_overlong_handle() {
        let raw = "a".repeat(MAX_HANDLE_LEN + 1);
        assert!(StreamerHandle::parse(&raw).is_err());
        assert!(StreamerHandle::parse(&"a".repeat(MAX_HANDLE_LEN)).is_ok());
    }
}
