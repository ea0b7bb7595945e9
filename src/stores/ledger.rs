//! Defines the ledger store trait.

use time::Date;

use crate::{
    Error, RuleId, UserId,
    ledger::{LedgerEntry, LedgerEntryBuilder, LedgerQuery},
};

/// Handles the creation and retrieval of ledger entries.
pub trait LedgerStore {
    /// Create a new manual entry in the store.
    fn create(&mut self, builder: LedgerEntryBuilder) -> Result<LedgerEntry, Error>;

    /// Insert an entry materialized from a recurring rule.
    ///
    /// Implementers must enforce uniqueness on the `(source_rule_id, date)`
    /// attribution key and report an already-present pair as `Ok(None)`
    /// rather than inserting a duplicate or raising an error.
    fn insert_materialized(
        &mut self,
        builder: LedgerEntryBuilder,
    ) -> Result<Option<LedgerEntry>, Error>;

    /// Find the entry materialized from `rule_id` on `date`, if one exists.
    fn find_materialized(
        &self,
        user_id: UserId,
        rule_id: RuleId,
        date: Date,
    ) -> Result<Option<LedgerEntry>, Error>;

    /// Retrieve entries from the store in the way defined by `query`.
    fn get_query(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>, Error>;
}
