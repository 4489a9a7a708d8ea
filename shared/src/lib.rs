//! Shared types and domain logic for the Artis inventory platform.
//!
//! This crate holds the ledger model, the pure stock/consumption aggregates,
//! and the validation of externally sourced spreadsheet rows. It is kept free
//! of I/O so every rule stays unit-testable.

pub mod ledger;
pub mod models;
pub mod rows;
pub mod validation;

pub use models::*;
pub use validation::*;
