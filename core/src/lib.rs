//! Visitor ledger core: records group visits to a site as per-ticket-category
//! rows in a flat file and summarizes the accumulated history.

pub mod allocator;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod store;
pub mod submission;
pub mod summary;
pub mod types;

pub use engine::VisitorDesk;
pub use error::{LedgerError, LedgerResult, SchemaMismatch, ValidationError};
