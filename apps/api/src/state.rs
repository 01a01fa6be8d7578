//! Shared application state and the per-request unit of work.

use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ward_core::MappingProfile;
use ward_db::{Database, UnitOfWork};

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
///
/// Everything here is immutable or internally synchronized; requests share
/// nothing else.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub mapping: MappingProfile,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            db,
            mapping: MappingProfile::new(),
            jwt: Arc::new(JwtManager::new(
                &config.auth.jwt_secret,
                config.auth.token_lifetime_secs,
            )),
        }
    }

    /// Replaces the mapping profile (tests pin its clock).
    pub fn with_mapping(mut self, mapping: MappingProfile) -> Self {
        self.mapping = mapping;
        self
    }
}

/// A unit of work scoped to one request.
///
/// Extracted per handler call; the transaction it may hold is rolled back
/// when the handler returns without committing.
pub struct RequestUnitOfWork(UnitOfWork);

impl FromRequestParts<AppState> for RequestUnitOfWork {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(RequestUnitOfWork(state.db.unit_of_work()))
    }
}

impl Deref for RequestUnitOfWork {
    type Target = UnitOfWork;

    fn deref(&self) -> &UnitOfWork {
        &self.0
    }
}

impl DerefMut for RequestUnitOfWork {
    fn deref_mut(&mut self) -> &mut UnitOfWork {
        &mut self.0
    }
}

/// A unit of work for handlers that check the store and then write.
///
/// Begins with `BEGIN IMMEDIATE`, so two such requests touching the same
/// rows run one after the other and the later one sees the earlier commit.
pub struct WriteUnitOfWork(UnitOfWork);

impl FromRequestParts<AppState> for WriteUnitOfWork {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(WriteUnitOfWork(state.db.write_unit_of_work()))
    }
}

impl Deref for WriteUnitOfWork {
    type Target = UnitOfWork;

    fn deref(&self) -> &UnitOfWork {
        &self.0
    }
}

impl DerefMut for WriteUnitOfWork {
    fn deref_mut(&mut self) -> &mut UnitOfWork {
        &mut self.0
    }
}
