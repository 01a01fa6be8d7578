//! # ward-db: Database Layer for Ward
//!
//! This crate provides database access for the Ward patient API.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ward Data Flow                                 │
//! │                                                                         │
//! │  HTTP request (GET /api/patients/search/0/4/smith)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ward-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Database    │   │  UnitOfWork   │   │  Repository<T> │   │   │
//! │  │   │   (pool.rs)   │──►│   (uow.rs)    │◄──│ (repository/)  │   │   │
//! │  │   │  SqlitePool   │   │ one tx / req  │   │ EntityQuery    │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   migrations/0001_initial_schema.sql (embedded)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`uow`] - Store handle factory and unit of work
//! - [`repository`] - Generic repository, lazy queries, entity mappings
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ward_db::{Database, DbConfig, Repository};
//! use ward_db::repository::patient::search_filter;
//!
//! let db = Database::new(DbConfig::new("ward.db")).await?;
//!
//! let mut uow = db.unit_of_work();
//! let page = uow
//!     .repository::<Patient>()
//!     .find_by(search_filter("smith"))
//!     .paginate(PageRequest::new(0, 4)?)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod uow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{Entity, EntityQuery, EntityRepository, Predicate, Repository};
pub use uow::{DbFactory, TransactionMode, UnitOfWork};
