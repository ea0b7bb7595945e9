//! Implements a SQLite backed ledger store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::Date;

use crate::{
    Error, RuleId, UserId,
    ledger::{
        LedgerEntry, LedgerEntryBuilder, LedgerQuery, create_entry, find_materialized_entry,
        get_entries, insert_materialized_entry,
    },
    stores::LedgerStore,
};

/// Stores ledger entries in a SQLite database.
///
/// Note that because entries depend on the [Category](crate::category::Category)
/// and [RecurringRule](crate::rule::RecurringRule) models, these models must
/// be set up in the database (see [crate::db::initialize]).
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl LedgerStore for SQLiteLedgerStore {
    fn create(&mut self, builder: LedgerEntryBuilder) -> Result<LedgerEntry, Error> {
        create_entry(builder, &*self.connection()?)
    }

    fn insert_materialized(
        &mut self,
        builder: LedgerEntryBuilder,
    ) -> Result<Option<LedgerEntry>, Error> {
        insert_materialized_entry(builder, &*self.connection()?)
    }

    fn find_materialized(
        &self,
        user_id: UserId,
        rule_id: RuleId,
        date: Date,
    ) -> Result<Option<LedgerEntry>, Error> {
        find_materialized_entry(user_id, rule_id, date, &*self.connection()?)
    }

    fn get_query(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>, Error> {
        get_entries(query, &*self.connection()?)
    }
}
