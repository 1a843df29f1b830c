//! Shared types and business rules for the Produce Trade Ledger
//!
//! This crate contains the pure domain layer shared between the backend and
//! any other consumer of the ledger: entity models, the derivation engine
//! that computes invoice totals and balances, and the aggregation engine
//! that rolls committed entity state up into report figures. Nothing in
//! here performs I/O.

pub mod aggregation;
pub mod derivation;
pub mod models;
pub mod types;
pub mod validation;

pub use aggregation::*;
pub use derivation::*;
pub use models::*;
pub use types::*;
pub use validation::*;
