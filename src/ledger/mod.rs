//! The ledger of dated income and expense entries.
//!
//! Entries are immutable once created. Manual entries come from the
//! presentation layer's forms; materialized entries are stamped with the
//! recurring rule that produced them so that each rule yields at most one
//! entry per date.

mod core;

pub use core::{
    EntryKind, EntryKindError, LedgerEntry, LedgerEntryBuilder, LedgerQuery, create_entry,
    create_ledger_table, find_materialized_entry, get_entries, insert_materialized_entry,
};
