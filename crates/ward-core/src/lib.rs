//! # ward-core: Pure Domain Logic for Ward
//!
//! This crate holds the patient domain as pure functions and plain types,
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ward Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser client (SPA)                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum controllers)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ward-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation│  │ pagination │  │  mapping  │  │   │
//! │  │   │  Patient  │  │   rules   │  │ PageRequest│  │  Profile  │  │   │
//! │  │   │ ViewModel │  │  messages │  │ PaginSet   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ward-db (Database Layer)                     │   │
//! │  │          SQLite, unit of work, generic repository               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities and view models (Patient, PatientViewModel, ErrorLog)
//! - [`validation`] - Field rules and route-parameter parsing
//! - [`pagination`] - Page math and the paged response shape
//! - [`mapping`] - Entity ↔ view-model mapping profile
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ward_core::pagination::{PageRequest, PaginationSet};
//!
//! let request = PageRequest::new(0, 4).unwrap();
//! let page = PaginationSet::new(request, 10, vec!["a", "b", "c", "d"]);
//!
//! assert_eq!(page.total_pages, 3);
//! assert_eq!(page.count, 4);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod mapping;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use mapping::MappingProfile;
pub use pagination::{PageRequest, PaginationSet};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Role a caller must hold to use the patient API.
pub const ADMIN_ROLE: &str = "Admin";
