//! # Domain Types
//!
//! Core domain types used throughout Ward.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Entities (persisted)                 View Models (transport)           │
//! │  ┌─────────────────────┐              ┌─────────────────────┐           │
//! │  │      Patient        │   mapping    │  PatientViewModel   │           │
//! │  │  ─────────────────  │ ◄──────────► │  ─────────────────  │           │
//! │  │  id (i64)           │              │  id                 │           │
//! │  │  email (natural key)│              │  camelCase JSON     │           │
//! │  │  identity_card (nk) │              │                     │           │
//! │  └─────────────────────┘              └─────────────────────┘           │
//! │                                                                         │
//! │  ┌─────────────────────┐                                                │
//! │  │      ErrorLog       │  Unexpected request failures                   │
//! │  └─────────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A patient has:
//! - `id`: integer assigned by the store - immutable, used for lookups
//! - Natural keys: `email`, `identity_card` - unique case-insensitively

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier value carried by entities before the store assigns one.
pub const UNASSIGNED_ID: i64 = 0;

// =============================================================================
// Patient
// =============================================================================

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Patient {
    /// Store-assigned identifier ([`UNASSIGNED_ID`] until inserted).
    pub id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Natural key, unique ignoring case.
    pub email: String,

    /// National identity card number. Natural key, unique ignoring case.
    pub identity_card: String,

    /// Stable external key (UUID v4 text).
    pub unique_key: String,

    pub date_of_birth: NaiveDate,

    /// Ten-digit mobile number.
    pub mobile: String,

    /// When the patient was registered.
    pub registration_date: DateTime<Utc>,
}

impl Patient {
    /// Checks whether the patient has been persisted.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}

// =============================================================================
// Patient View Model
// =============================================================================

/// Transport shape of a patient, used for request and response bodies.
///
/// `id` is also accepted as `ID` on input for clients written against the
/// PascalCase contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PatientViewModel {
    #[serde(default, alias = "ID")]
    #[ts(type = "number")]
    pub id: i64,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub identity_card: String,

    /// Filled on registration when absent or nil.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub unique_key: Option<Uuid>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub mobile: String,

    /// Filled on registration when absent.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub registration_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Error Log
// =============================================================================

/// An unexpected failure recorded for later diagnosis.
///
/// Written by the HTTP layer when a request ends in a 500-class error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ErrorLog {
    pub id: i64,
    pub message: String,
    pub stack_trace: Option<String>,
    pub date_created: DateTime<Utc>,
}

impl ErrorLog {
    /// Creates an unsaved entry stamped with `now`.
    pub fn new(message: impl Into<String>, stack_trace: Option<String>, now: DateTime<Utc>) -> Self {
        ErrorLog {
            id: UNASSIGNED_ID,
            message: message.into(),
            stack_trace,
            date_created: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_model_accepts_pascal_id() {
        let vm: PatientViewModel =
            serde_json::from_str(r#"{"ID": 7, "firstName": "Ada"}"#).unwrap();
        assert_eq!(vm.id, 7);
        assert_eq!(vm.first_name, "Ada");
        assert!(vm.unique_key.is_none());
    }

    #[test]
    fn test_view_model_serializes_camel_case() {
        let vm = PatientViewModel {
            id: 3,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            identity_card: "X1".into(),
            unique_key: None,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10),
            mobile: "0123456789".into(),
            registration_date: None,
        };
        let json = serde_json::to_value(&vm).unwrap();
        assert_eq!(json["identityCard"], "X1");
        assert_eq!(json["dateOfBirth"], "1990-12-10");
    }

    #[test]
    fn test_error_log_is_unsaved() {
        let entry = ErrorLog::new("boom", None, Utc::now());
        assert_eq!(entry.id, UNASSIGNED_ID);
    }
}
