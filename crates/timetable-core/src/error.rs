//! Validation errors for manually entered events.

use thiserror::Error;

/// Result type for manual event validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while building a manual event from user input.
///
/// The display text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The date is malformed or not a real calendar date.
    #[error("Date must use DD/MM/YYYY or YYYY-MM-DD format.")]
    InvalidDate,

    /// A time is malformed, out of range, or does not exist in the timezone.
    #[error("Time must use HH:MM format.")]
    InvalidTime,

    /// The end instant is not strictly after the start instant.
    #[error("End time must be after start time.")]
    InvalidRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ValidationError::InvalidDate.to_string(),
            "Date must use DD/MM/YYYY or YYYY-MM-DD format."
        );
        assert_eq!(
            ValidationError::InvalidTime.to_string(),
            "Time must use HH:MM format."
        );
        assert_eq!(
            ValidationError::InvalidRange.to_string(),
            "End time must be after start time."
        );
    }
}
