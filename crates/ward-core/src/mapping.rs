//! # Mapping Profile
//!
//! Entity ↔ view-model conversion rules.
//!
//! The profile is an ordinary value built at startup and handed to the HTTP
//! layer through its state, so two servers in one process (or a test) can use
//! different clocks without touching shared globals.
//!
//! ## Directions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   reads:   Patient ──── to_view_model ────► PatientViewModel            │
//! │   writes:  PatientViewModel ── apply ────► Patient (new or existing)    │
//! │                                                                         │
//! │   apply() fills defaults the client may omit:                           │
//! │     unique_key        None / nil  → fresh UUID v4                       │
//! │     registration_date None        → clock()                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::types::{Patient, PatientViewModel, UNASSIGNED_ID};

/// Source of "now" for defaults.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Explicit mapping configuration for patients.
#[derive(Clone)]
pub struct MappingProfile {
    clock: Clock,
}

impl MappingProfile {
    /// Creates a profile that stamps defaults with the system clock.
    pub fn new() -> Self {
        MappingProfile {
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock (tests pin it to a fixed instant).
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Current instant according to the profile's clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Current date according to the profile's clock.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Projects an entity onto its transport shape.
    pub fn to_view_model(&self, patient: &Patient) -> PatientViewModel {
        PatientViewModel {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            identity_card: patient.identity_card.clone(),
            unique_key: Uuid::parse_str(&patient.unique_key).ok(),
            date_of_birth: Some(patient.date_of_birth),
            mobile: patient.mobile.clone(),
            registration_date: Some(patient.registration_date),
        }
    }

    /// Builds a new, unsaved entity from a validated view model.
    ///
    /// The view model's `id` is ignored; the store assigns one.
    pub fn new_patient(&self, vm: &PatientViewModel) -> Patient {
        let mut patient = Patient {
            id: UNASSIGNED_ID,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            identity_card: String::new(),
            unique_key: String::new(),
            date_of_birth: NaiveDate::default(),
            mobile: String::new(),
            registration_date: self.now(),
        };
        self.apply(vm, &mut patient);
        patient
    }

    /// Copies every editable field of `vm` onto `patient`.
    ///
    /// Text fields are trimmed. A missing date of birth leaves the current
    /// value in place; validation rejects that case before mapping.
    pub fn apply(&self, vm: &PatientViewModel, patient: &mut Patient) {
        patient.first_name = vm.first_name.trim().to_string();
        patient.last_name = vm.last_name.trim().to_string();
        patient.email = vm.email.trim().to_string();
        patient.identity_card = vm.identity_card.trim().to_string();
        patient.mobile = vm.mobile.trim().to_string();

        if let Some(dob) = vm.date_of_birth {
            patient.date_of_birth = dob;
        }

        patient.unique_key = match vm.unique_key {
            Some(key) if !key.is_nil() => key.to_string(),
            _ if !patient.unique_key.is_empty() => patient.unique_key.clone(),
            _ => Uuid::new_v4().to_string(),
        };

        patient.registration_date = vm.registration_date.unwrap_or(patient.registration_date);
    }
}

impl Default for MappingProfile {
    fn default() -> Self {
        MappingProfile::new()
    }
}

impl fmt::Debug for MappingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingProfile").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn vm() -> PatientViewModel {
        PatientViewModel {
            id: 99,
            first_name: " Ada ".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            identity_card: "ID-1".into(),
            unique_key: None,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10),
            mobile: "0123456789".into(),
            registration_date: None,
        }
    }

    #[test]
    fn test_new_patient_fills_defaults() {
        let profile = MappingProfile::new().with_clock(fixed_now);
        let patient = profile.new_patient(&vm());

        assert_eq!(patient.id, UNASSIGNED_ID);
        assert_eq!(patient.first_name, "Ada");
        assert_eq!(patient.registration_date, fixed_now());
        assert!(Uuid::parse_str(&patient.unique_key).is_ok());
    }

    #[test]
    fn test_nil_unique_key_is_replaced() {
        let profile = MappingProfile::new();
        let input = PatientViewModel {
            unique_key: Some(Uuid::nil()),
            ..vm()
        };
        let patient = profile.new_patient(&input);
        assert_ne!(patient.unique_key, Uuid::nil().to_string());
    }

    #[test]
    fn test_apply_keeps_existing_key_and_date() {
        let profile = MappingProfile::new().with_clock(fixed_now);
        let mut patient = profile.new_patient(&vm());
        let key = patient.unique_key.clone();

        let edit = PatientViewModel {
            last_name: "King".into(),
            ..vm()
        };
        profile.apply(&edit, &mut patient);

        assert_eq!(patient.last_name, "King");
        assert_eq!(patient.unique_key, key);
        assert_eq!(patient.registration_date, fixed_now());
    }

    #[test]
    fn test_view_model_round_trip_fields() {
        let profile = MappingProfile::new().with_clock(fixed_now);
        let mut patient = profile.new_patient(&vm());
        patient.id = 5;

        let out = profile.to_view_model(&patient);
        assert_eq!(out.id, 5);
        assert_eq!(out.first_name, "Ada");
        assert_eq!(out.unique_key.map(|k| k.to_string()), Some(patient.unique_key));
        assert_eq!(out.registration_date, Some(fixed_now()));
    }
}
