//! Subject rules for NATS publishes.

use crate::error::RequestError;

/// Prefix used by NATS clients for generated reply subjects.
pub const INBOX_PREFIX: &str = "_INBOX";

/// Subject helpers.
pub struct SubjectPatterns;

impl SubjectPatterns {
    /// Whether `subject` can be published to.
    ///
    /// Tokens are separated by `.`, must be non-empty, and may not contain
    /// whitespace or the `*` / `>` wildcards.
    #[must_use]
    pub fn is_publishable(subject: &str) -> bool {
        !subject.is_empty()
            && subject.split('.').all(|token| {
                !token.is_empty()
                    && token != "*"
                    && token != ">"
                    && !token.chars().any(char::is_whitespace)
            })
    }

    /// Reject subjects that cannot be published to.
    pub fn validate_publish(subject: &str) -> Result<(), RequestError> {
        if Self::is_publishable(subject) {
            Ok(())
        } else {
            Err(RequestError::InvalidArgument(format!(
                "invalid publish subject: {subject:?}"
            )))
        }
    }

    /// Whether `subject` looks like a generated reply inbox.
    #[must_use]
    pub fn is_inbox(subject: &str) -> bool {
        subject
            .strip_prefix(INBOX_PREFIX)
            .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
    }
}
