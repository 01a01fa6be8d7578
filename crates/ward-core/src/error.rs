//! # Error Types
//!
//! Domain-specific error types for ward-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ward-core errors (this file)                                          │
//! │  ├── CoreError         - Business rule violations                      │
//! │  ├── ValidationError   - One violated field rule                       │
//! │  └── ValidationErrors  - Every violated rule, in rule order            │
//! │                                                                         │
//! │  ward-db errors (separate crate)                                       │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError          - What the HTTP client sees                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → 400 [messages...]      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Another patient already owns the email or identity card number.
    ///
    /// ## When This Occurs
    /// - Registering a patient whose email matches an existing one (any case)
    /// - Updating a patient onto another patient's identity card
    /// - The store's unique index fires after a concurrent registration
    #[error("Email or Identity Card number already exists")]
    DuplicatePatient,

    /// One or more field rules failed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

impl CoreError {
    /// Flattens the error into the message list the HTTP layer returns.
    ///
    /// Business-rule violations share the validation-message shape so the
    /// client renders both the same way.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CoreError::DuplicatePatient => vec![self.to_string()],
            CoreError::Validation(errors) => errors.messages(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any repository access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field length is outside the allowed range.
    #[error("{field} must be between {min} - {max} characters")]
    Length { field: String, min: usize, max: usize },

    /// Numeric value is below its minimum.
    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: i64 },

    /// Invalid format (e.g., malformed email, non-numeric route value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Free-form rule message.
    #[error("{0}")]
    Rule(String),
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Ordered collection of every rule a value violated.
///
/// Rules are checked in declaration order and each failing rule contributes
/// one entry, so the message list is stable for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    /// Records a violated rule.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Returns true if no rule was violated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the violated rules.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns one human-readable message per violated rule.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Converts into a `Result`, failing if any rule was violated.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }
}

impl From<ValidationError> for CoreError {
    fn from(error: ValidationError) -> Self {
        CoreError::Validation(error.into())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
