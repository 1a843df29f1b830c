//! Domain models for the Produce Trade Ledger

mod expense;
mod packaging;
mod party;
mod payment;
mod product;
mod purchase;
mod sales;

pub use expense::*;
pub use packaging::*;
pub use party::*;
pub use payment::*;
pub use product::*;
pub use purchase::*;
pub use sales::*;
