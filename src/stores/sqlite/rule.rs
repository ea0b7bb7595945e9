//! Implements a SQLite backed recurring rule store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::Date;

use crate::{
    Error, UserId,
    rule::{RecurringRule, RuleBuilder, create_rule, get_active_rules, get_rules_for_user},
    stores::RuleStore,
};

/// Stores recurring rules in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteRuleStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteRuleStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl RuleStore for SQLiteRuleStore {
    fn create(&mut self, builder: RuleBuilder) -> Result<RecurringRule, Error> {
        create_rule(builder, &*self.connection()?)
    }

    fn get_for_user(&self, user_id: UserId) -> Result<Vec<RecurringRule>, Error> {
        get_rules_for_user(user_id, &*self.connection()?)
    }

    fn get_active(
        &self,
        user_id: UserId,
        as_of_date: Date,
    ) -> Result<Vec<RecurringRule>, Error> {
        get_active_rules(user_id, as_of_date, &*self.connection()?)
    }
}
