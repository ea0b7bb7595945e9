/*! This module ties together the table definitions for the application's database. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    category::create_category_table, ledger::create_ledger_table, rule::create_rule_table,
};

/// Create the tables and indexes for the domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// half-initialized schema is never observable. Foreign key enforcement is
/// switched on for `connection`; SQLite leaves it off per connection by
/// default.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_rule_table(&transaction)?;
    create_ledger_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table'
                   AND name IN ('category', 'recurring_rule', 'ledger_entry');",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 3);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");
        initialize(&conn).expect("Initializing twice should not fail");
    }
}
