//! Descriptor validation errors.

use thiserror::Error;

/// A descriptor field is malformed, out of range, or describes unsupported geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {message}")]
pub struct SpecValidationError {
    /// Name of the offending descriptor field (or derived property)
    pub field: String,
    /// Human readable explanation
    pub message: String,
}

impl SpecValidationError {
    /// Create a new validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }

    /// Error for a required field that is absent from the descriptor.
    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("{} field not found in graphics json file", field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_field() {
        let err = SpecValidationError::new("height", "must be positive");
        assert_eq!(err.to_string(), "invalid `height`: must be positive");
    }

    #[test]
    fn test_missing() {
        let err = SpecValidationError::missing("type");
        assert_eq!(err.field, "type");
        assert!(err.message.contains("not found"));
    }
}
