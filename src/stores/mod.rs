//! Contains traits and implementations for objects that store the domain
//! models.
//!
//! The traits are the seam between the ledger core and whatever durable
//! store the application wires in: production code injects the SQLite-backed
//! implementations from [sqlite], tests may inject doubles.

mod category;
mod ledger;
mod rule;

pub mod sqlite;

pub use category::CategoryStore;
pub use ledger::LedgerStore;
pub use rule::RuleStore;
