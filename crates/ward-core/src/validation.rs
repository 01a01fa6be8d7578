//! # Validation Module
//!
//! Input validation for patient requests and route parameters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extraction (axum)                                       │
//! │  └── Body/route shape, parsed here into typed values                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field rules                                    │
//! │  └── Every rule runs; all failures are reported together, in order     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (controller + repository)                     │
//! │  └── Duplicate email / identity card                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE indexes on the case-folded email / card (race backstop)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rule Order
//! First name, last name, identity card, date of birth, mobile, email.
//! The message list a client receives follows this order.

use chrono::NaiveDate;

use crate::error::{ValidationError, ValidationErrors};
use crate::types::{PatientViewModel, UNASSIGNED_ID};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a first or last name.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of an identity card number.
pub const MAX_IDENTITY_CARD_LEN: usize = 50;

/// Number of digits in a mobile number.
pub const MOBILE_DIGITS: usize = 10;

// =============================================================================
// Patient Validator
// =============================================================================

/// Validates a patient view model against every field rule.
///
/// ## Rules
/// | Field | Rule | Message |
/// |---|---|---|
/// | first name | 1–100 chars after trim | `First Name must be between 1 - 100 characters` |
/// | last name | 1–100 chars after trim | `Last Name must be between 1 - 100 characters` |
/// | identity card | 1–50 chars after trim | `Identity Card must be between 1 - 50 characters` |
/// | date of birth | present, not after `today` | `Date of Birth is required` / `Date of Birth cannot be in the future` |
/// | mobile | exactly 10 ASCII digits | `Mobile phone must have 10 digits` |
/// | email | `local@domain.tld`, no spaces | `Enter a valid Email address` |
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use ward_core::validation::validate_patient;
/// use ward_core::PatientViewModel;
///
/// let vm = PatientViewModel {
///     id: 0,
///     first_name: String::new(),
///     last_name: "Lovelace".into(),
///     email: "ada@example.com".into(),
///     identity_card: "ID-1".into(),
///     unique_key: None,
///     date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
///     mobile: "0123456789".into(),
///     registration_date: None,
/// };
/// let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let errors = validate_patient(&vm, today).unwrap_err();
/// assert_eq!(errors.messages(), vec!["First Name must be between 1 - 100 characters"]);
/// ```
pub fn validate_patient(vm: &PatientViewModel, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_patient_fields(vm, today, &mut errors);
    errors.into_result()
}

/// Validates an update body: the `ID` must be present, then every field
/// rule of [`validate_patient`] applies.
pub fn validate_patient_update(
    vm: &PatientViewModel,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if vm.id <= UNASSIGNED_ID {
        errors.push(ValidationError::required("ID"));
    }
    check_patient_fields(vm, today, &mut errors);
    errors.into_result()
}

fn check_patient_fields(vm: &PatientViewModel, today: NaiveDate, errors: &mut ValidationErrors) {
    let checks = [
        validate_length("First Name", &vm.first_name, MAX_NAME_LEN),
        validate_length("Last Name", &vm.last_name, MAX_NAME_LEN),
        validate_length("Identity Card", &vm.identity_card, MAX_IDENTITY_CARD_LEN),
        validate_date_of_birth(vm.date_of_birth, today),
        validate_mobile(&vm.mobile),
        validate_email(&vm.email),
    ];

    for check in checks {
        if let Err(e) = check {
            errors.push(e);
        }
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a trimmed string has 1..=max characters.
pub fn validate_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(ValidationError::Length {
            field: field.to_string(),
            min: 1,
            max,
        });
    }
    Ok(())
}

/// Validates a date of birth.
///
/// ## Rules
/// - Must be present
/// - Must not be later than `today`
pub fn validate_date_of_birth(dob: Option<NaiveDate>, today: NaiveDate) -> ValidationResult<()> {
    match dob {
        None => Err(ValidationError::required("Date of Birth")),
        Some(d) if d > today => Err(ValidationError::Rule(
            "Date of Birth cannot be in the future".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

/// Validates a mobile number: exactly ten ASCII digits.
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();
    if mobile.len() != MOBILE_DIGITS || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Rule(format!(
            "Mobile phone must have {} digits",
            MOBILE_DIGITS
        )));
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::Rule("Enter a valid Email address".to_string());
    let email = email.trim();

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot < domain.len() - 1 => Ok(()),
        _ => Err(invalid()),
    }
}

// =============================================================================
// Query & Route Validators
// =============================================================================

/// Case-folds text for case-insensitive comparison.
///
/// Uses full Unicode lower-casing, so `"ÉLODIE"` and `"élodie"` fold to the
/// same value. Stored search columns and query needles both go through this.
pub fn fold_case(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Normalizes a text filter for case-insensitive containment.
///
/// ## Returns
/// The trimmed, case-folded filter, or `None` when nothing is left.
pub fn normalize_filter(filter: &str) -> Option<String> {
    let filter = fold_case(filter);
    if filter.is_empty() {
        None
    } else {
        Some(filter)
    }
}

/// Parses a required, non-negative integer route segment.
///
/// ## Example
/// ```rust
/// use ward_core::validation::parse_route_u32;
///
/// assert_eq!(parse_route_u32("page", "2").unwrap(), 2);
/// assert!(parse_route_u32("page", "-1").is_err());
/// assert!(parse_route_u32("page", "two").is_err());
/// ```
pub fn parse_route_u32(field: &str, raw: &str) -> ValidationResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::invalid_format(field, "must be a non-negative integer"))
}

/// Parses a required integer identifier.
pub fn parse_route_id(field: &str, raw: &str) -> ValidationResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid_format(field, "must be an integer"))
}

// =============================================================================
// Unit Tests
// =============================================================================
