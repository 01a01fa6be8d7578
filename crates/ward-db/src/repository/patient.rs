//! # Patient Repository
//!
//! Table mapping for [`Patient`] plus the lookups the patient controller
//! needs on top of the generic repository.
//!
//! ## Search Fields
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────────┐
//! │ lookup                   │ folded columns                           │
//! ├──────────────────────────┼──────────────────────────────────────────┤
//! │ contact_filter  (list)   │ email, first_name, last_name  (contains) │
//! │ search_filter   (search) │ last_name, identity_card, first_name     │
//! │ user_exists              │ email = ? OR identity_card = ?           │
//! └──────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Every searchable field has a `*_folded` twin holding
//! [`fold_case`] of the value. The lookups above only touch the twins.

use tracing::debug;
use ward_core::validation::fold_case;
use ward_core::Patient;

use super::{Entity, EntityRepository, Predicate, Repository, SqlValue};
use crate::error::DbResult;

/// Column names of the `patients` table.
pub mod columns {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const IDENTITY_CARD: &str = "identity_card";
    pub const UNIQUE_KEY: &str = "unique_key";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const MOBILE: &str = "mobile";
    pub const REGISTRATION_DATE: &str = "registration_date";
    pub const FIRST_NAME_FOLDED: &str = "first_name_folded";
    pub const LAST_NAME_FOLDED: &str = "last_name_folded";
    pub const EMAIL_FOLDED: &str = "email_folded";
    pub const IDENTITY_CARD_FOLDED: &str = "identity_card_folded";
}

impl Entity for Patient {
    const NAME: &'static str = "Patient";
    const TABLE: &'static str = "patients";
    const COLUMNS: &'static [&'static str] = &[
        columns::FIRST_NAME,
        columns::LAST_NAME,
        columns::EMAIL,
        columns::IDENTITY_CARD,
        columns::UNIQUE_KEY,
        columns::DATE_OF_BIRTH,
        columns::MOBILE,
        columns::REGISTRATION_DATE,
        columns::FIRST_NAME_FOLDED,
        columns::LAST_NAME_FOLDED,
        columns::EMAIL_FOLDED,
        columns::IDENTITY_CARD_FOLDED,
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.first_name.clone()),
            SqlValue::Text(self.last_name.clone()),
            SqlValue::Text(self.email.clone()),
            SqlValue::Text(self.identity_card.clone()),
            SqlValue::Text(self.unique_key.clone()),
            SqlValue::Date(self.date_of_birth),
            SqlValue::Text(self.mobile.clone()),
            SqlValue::Timestamp(self.registration_date),
            SqlValue::Text(fold_case(&self.first_name)),
            SqlValue::Text(fold_case(&self.last_name)),
            SqlValue::Text(fold_case(&self.email)),
            SqlValue::Text(fold_case(&self.identity_card)),
        ]
    }
}

/// Filter for the plain patient list: email, first name or last name.
pub fn contact_filter(filter: &str) -> Predicate {
    Predicate::contains_in_any(
        &[
            columns::EMAIL_FOLDED,
            columns::FIRST_NAME_FOLDED,
            columns::LAST_NAME_FOLDED,
        ],
        filter,
    )
}

/// Filter for the paged search: last name, identity card or first name.
pub fn search_filter(filter: &str) -> Predicate {
    Predicate::contains_in_any(
        &[
            columns::LAST_NAME_FOLDED,
            columns::IDENTITY_CARD_FOLDED,
            columns::FIRST_NAME_FOLDED,
        ],
        filter,
    )
}

fn natural_key_match(email: &str, identity_card: &str) -> Predicate {
    Predicate::equals_folded(columns::EMAIL_FOLDED, email)
        .or(Predicate::equals_folded(columns::IDENTITY_CARD_FOLDED, identity_card))
}

impl EntityRepository<'_, Patient> {
    /// True iff some patient already has this email or identity card,
    /// ignoring case.
    pub async fn user_exists(&mut self, email: &str, identity_card: &str) -> DbResult<bool> {
        let exists = self
            .find_by(natural_key_match(email, identity_card))
            .exists()
            .await?;
        debug!(exists, "Checked patient natural keys");
        Ok(exists)
    }

    /// Like [`Self::user_exists`], ignoring the patient with `id`.
    pub async fn user_exists_except(
        &mut self,
        email: &str,
        identity_card: &str,
        id: i64,
    ) -> DbResult<bool> {
        let exists = self
            .find_by(natural_key_match(email, identity_card))
            .filter(Predicate::IdNotEquals(id))
            .exists()
            .await?;
        debug!(exists, id, "Checked patient natural keys for update");
        Ok(exists)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
