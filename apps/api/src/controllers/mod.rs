//! HTTP controllers.
//!
//! Each controller exposes a `routes()` router that `crate::router` nests
//! under its prefix.

pub mod health;
pub mod patients;
