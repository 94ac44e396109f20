//! Error handling types for mentionkit
//!
//! Only programming errors and configuration problems surface as errors.
//! Malformed markup and stale spans degrade silently instead.

use thiserror::Error;

/// Error type for mention tracking operations
#[derive(Debug, Error)]
pub enum MentionError {
    /// A syntax definition cannot be compiled
    #[error("Invalid syntax '{name}': {message}")]
    InvalidSyntax { name: String, message: String },

    /// Two syntaxes claim the same starting character
    #[error("Starting character '{trigger}' is claimed by more than one syntax")]
    DuplicateTrigger { trigger: char },

    /// `commit_mention` was called while no composition session is active
    #[error("No mention is being composed")]
    NotComposing,

    /// A deletion would shrink the composed token to zero or below
    #[error("Composed token of length {length} cannot shrink by {removed}")]
    CompositionUnderflow { length: usize, removed: usize },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for mention tracking operations
pub type MentionResult<T> = Result<T, MentionError>;

/// Helper functions for common error patterns
impl MentionError {
    /// Create an invalid syntax error
    pub fn invalid_syntax(name: impl Into<String>, message: impl Into<String>) -> Self {
        MentionError::InvalidSyntax {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        MentionError::Config {
            message: message.into(),
        }
    }

    /// True for errors that signal caller misuse rather than bad input.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            MentionError::NotComposing | MentionError::CompositionUnderflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_are_flagged() {
        assert!(MentionError::NotComposing.is_precondition_violation());
        assert!(
            MentionError::CompositionUnderflow {
                length: 1,
                removed: 2
            }
            .is_precondition_violation()
        );
        assert!(!MentionError::config("bad").is_precondition_violation());
    }

    #[test]
    fn display_messages_name_the_offender() {
        let err = MentionError::invalid_syntax("user", "empty prefix");
        assert_eq!(err.to_string(), "Invalid syntax 'user': empty prefix");

        let err = MentionError::DuplicateTrigger { trigger: '@' };
        assert!(err.to_string().contains("'@'"));
    }
}
