//! Business services for the Produce Trade Ledger

pub mod expense;
pub mod inventory;
pub mod party;
pub mod payment;
pub mod purchase;
pub mod reporting;
pub mod sales;

pub use expense::ExpenseService;
pub use inventory::InventoryService;
pub use party::PartyService;
pub use payment::PaymentService;
pub use purchase::PurchaseService;
pub use reporting::ReportingService;
pub use sales::SalesService;
