//! # Ward API
//!
//! HTTP server for patient management.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Ward API Router                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  layers (outer → inner): log_requests, record_failures           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  GET /health ─────────────────────────────► health (no auth)            │
//! │                                                                         │
//! │  /api/patients ──► require_admin ──► patients controller                │
//! │                        │                 │                              │
//! │                        401 / 403         ▼                              │
//! │                                   RequestUnitOfWork ──► ward-db         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `WARD_CONFIG` - TOML config file
//! - `WARD_BIND_ADDR` / `WARD_PORT` - listener
//! - `WARD_DATABASE_PATH` - SQLite file or `:memory:`
//! - `WARD_MAX_CONNECTIONS` - pool size
//! - `WARD_JWT_SECRET` / `WARD_JWT_LIFETIME_SECS` - bearer tokens

pub mod auth;
pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod state;

use axum::routing::get;
use axum::Router;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let patients = controllers::patients::routes().route_layer(
        axum::middleware::from_fn_with_state(state.clone(), auth::require_admin),
    );

    Router::new()
        .route("/health", get(controllers::health::health))
        .nest("/api/patients", patients)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::record_failures,
        ))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}
