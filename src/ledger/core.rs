//! Defines the core data models and database queries for ledger entries.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    CategoryId, Error, RuleId, UserId,
    database_id::EntryId,
    money::{amount_from_row, amount_to_sql, validate_amount},
};

// ============================================================================
// MODELS
// ============================================================================

/// The error returned when an integer code does not map to an entry kind.
#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid entry kind code")]
pub struct EntryKindError(i64);

/// Whether an entry records money coming in or going out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum EntryKind {
    /// Money earned, e.g. wages.
    Income = 0,
    /// Money spent, e.g. groceries.
    Expense = 1,
}

impl TryFrom<i64> for EntryKind {
    type Error = EntryKindError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryKind::Income),
            1 => Ok(EntryKind::Expense),
            _ => Err(EntryKindError(value)),
        }
    }
}

/// A dated income or expense record.
///
/// The amount is always positive; `kind` records the direction of the money.
/// Entries are immutable once created.
///
/// To create a new `LedgerEntry`, use [LedgerEntry::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The ID of the entry.
    pub id: EntryId,
    /// The user that owns this entry.
    pub user_id: UserId,
    /// Whether this entry is income or an expense.
    pub kind: EntryKind,
    /// The amount of money earned or spent.
    pub amount: Decimal,
    /// The ID of the category the entry belongs to.
    pub category_id: CategoryId,
    /// A text description of what the entry was for.
    pub description: String,
    /// The date the income or expense is effective.
    pub date: Date,
    /// When the entry row was created.
    pub created_at: OffsetDateTime,
    /// The recurring rule that produced this entry, if any.
    ///
    /// `None` means the entry was created manually. Together with `date`,
    /// this is the attribution key that keeps materialization idempotent.
    pub source_rule_id: Option<RuleId>,
}

impl LedgerEntry {
    /// Create a new ledger entry.
    ///
    /// Shortcut for [LedgerEntryBuilder] for discoverability.
    pub fn build(
        user_id: UserId,
        kind: EntryKind,
        amount: Decimal,
        category_id: CategoryId,
        date: Date,
    ) -> LedgerEntryBuilder {
        LedgerEntryBuilder {
            user_id,
            kind,
            amount,
            category_id,
            date,
            description: String::new(),
            source_rule_id: None,
        }
    }
}

/// A builder for creating [LedgerEntry] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct LedgerEntryBuilder {
    /// The user that will own the entry.
    pub user_id: UserId,
    /// Whether the entry is income or an expense.
    pub kind: EntryKind,
    /// The amount of money earned or spent. Must be positive.
    pub amount: Decimal,
    /// The ID of the category the entry belongs to.
    pub category_id: CategoryId,
    /// The date the income or expense is effective.
    pub date: Date,
    /// A human-readable description of the entry. Defaults to an empty string.
    pub description: String,
    /// The recurring rule the entry is materialized from, or `None` for
    /// manual entries.
    pub source_rule_id: Option<RuleId>,
}

impl LedgerEntryBuilder {
    /// Set the description for the entry.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Mark the entry as materialized from `rule_id`.
    pub fn source_rule(mut self, rule_id: RuleId) -> Self {
        self.source_rule_id = Some(rule_id);
        self
    }
}

/// Defines which ledger entries [get_entries] should fetch.
///
/// Results are always ordered by date, then ID, ascending.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    /// The user whose entries to fetch.
    pub user_id: UserId,
    /// Only include entries of this kind. `None` includes both kinds.
    pub kind: Option<EntryKind>,
    /// Only include entries within this date range (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
}

impl LedgerQuery {
    /// Create a query for all of a user's entries.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            kind: None,
            date_range: None,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const ENTRY_COLUMNS: &str =
    "id, user_id, kind, amount, category_id, description, date, created_at, source_rule_id";

/// Create a new manual ledger entry in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the builder's amount is zero or negative,
/// - [Error::InvalidCategory] if the builder's category ID does not refer to
///   a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_entry(
    builder: LedgerEntryBuilder,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    validate_amount(builder.amount)?;

    let query = format!(
        "INSERT INTO ledger_entry \
            (user_id, kind, amount, category_id, description, date, created_at, source_rule_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING {ENTRY_COLUMNS}"
    );

    let entry = connection
        .prepare(&query)?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.kind as i64,
                amount_to_sql(builder.amount),
                builder.category_id,
                builder.description,
                builder.date,
                OffsetDateTime::now_utc(),
                builder.source_rule_id,
            ),
            map_entry_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(builder.category_id)),
            error => error.into(),
        })?;

    Ok(entry)
}

/// Insert a materialized ledger entry, treating an attribution conflict as a
/// no-op.
///
/// The builder must have its source rule set. If an entry for the same
/// `(source_rule_id, date)` pair already exists (including one inserted by a
/// concurrent materialization run), no row is written and `Ok(None)` is
/// returned.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the builder's amount is zero or negative,
/// - [Error::InvalidCategory] if the builder's category ID does not refer to
///   a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_materialized_entry(
    builder: LedgerEntryBuilder,
    connection: &Connection,
) -> Result<Option<LedgerEntry>, Error> {
    validate_amount(builder.amount)?;

    let query = format!(
        "INSERT INTO ledger_entry \
            (user_id, kind, amount, category_id, description, date, created_at, source_rule_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT DO NOTHING
         RETURNING {ENTRY_COLUMNS}"
    );

    let result = connection.prepare(&query)?.query_row(
        (
            builder.user_id.as_i64(),
            builder.kind as i64,
            amount_to_sql(builder.amount),
            builder.category_id,
            builder.description,
            builder.date,
            OffsetDateTime::now_utc(),
            builder.source_rule_id,
        ),
        map_entry_row,
    );

    match result {
        Ok(entry) => Ok(Some(entry)),
        // The conflict clause suppressed the insert, so nothing was returned.
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        )) => Err(Error::InvalidCategory(Some(builder.category_id))),
        Err(error) => Err(error.into()),
    }
}

/// Find the entry materialized from `rule_id` on `date`, if one exists.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn find_materialized_entry(
    user_id: UserId,
    rule_id: RuleId,
    date: Date,
    connection: &Connection,
) -> Result<Option<LedgerEntry>, Error> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entry
         WHERE user_id = ?1 AND source_rule_id = ?2 AND date = ?3"
    );

    let result = connection
        .prepare(&query)?
        .query_row((user_id.as_i64(), rule_id, date), map_entry_row);

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve ledger entries in the way defined by `query`, ordered by date
/// then ID.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_entries(
    query: &LedgerQuery,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entry WHERE user_id = ?");
    let mut params: Vec<Value> = vec![Value::Integer(query.user_id.as_i64())];

    if let Some(kind) = query.kind {
        sql.push_str(" AND kind = ?");
        params.push(Value::Integer(kind as i64));
    }

    if let Some(range) = &query.date_range {
        sql.push_str(" AND date BETWEEN ? AND ?");
        params.push(Value::Text(range.start().to_string()));
        params.push(Value::Text(range.end().to_string()));
    }

    sql.push_str(" ORDER BY date ASC, id ASC;");

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params), map_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Create the ledger entry table in the database.
///
/// The partial unique index on `(source_rule_id, date)` is what makes
/// materialization idempotent: a second insert for the same rule and date is
/// rejected at the storage layer no matter which process issues it. Manual
/// entries have a NULL source rule and are not constrained.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind INTEGER NOT NULL,
                amount TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                source_rule_id INTEGER,
                FOREIGN KEY(category_id) REFERENCES category(id),
                FOREIGN KEY(source_rule_id) REFERENCES recurring_rule(id)
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('ledger_entry', 0)",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_ledger_entry_rule_date
         ON ledger_entry(source_rule_id, date)
         WHERE source_rule_id IS NOT NULL;",
        (),
    )?;

    // Composite index used by the aggregate view queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_user_date ON ledger_entry(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a LedgerEntry.
pub fn map_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let kind_code: i64 = row.get(2)?;
    let kind = EntryKind::try_from(kind_code).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(error))
    })?;
    let amount = amount_from_row(row, 3)?;
    let category_id = row.get(4)?;
    let description = row.get(5)?;
    let date = row.get(6)?;
    let created_at = row.get(7)?;
    let source_rule_id = row.get(8)?;

    Ok(LedgerEntry {
        id,
        user_id,
        kind,
        amount,
        category_id,
        description,
        date,
        created_at,
        source_rule_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error, UserId,
        category::{Category, CategoryName, create_category},
        db::initialize,
        ledger::{
            EntryKind, LedgerEntry, LedgerQuery, create_entry, find_materialized_entry,
            get_entries, insert_materialized_entry,
        },
        rule::{RecurringRule, create_rule},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_category(name: &str, conn: &Connection) -> Category {
        create_category(CategoryName::new_unchecked(name), conn)
            .expect("Could not create test category")
    }

    fn amount(text: &str) -> Decimal {
        text.parse().expect("Could not parse test amount")
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let category = create_test_category("Groceries", &conn);
        let user_id = UserId::new(1);

        let result = create_entry(
            LedgerEntry::build(
                user_id,
                EntryKind::Expense,
                amount("12.30"),
                category.id,
                date!(2024 - 02 - 15),
            )
            .description("weekly shop"),
            &conn,
        );

        match result {
            Ok(entry) => {
                assert_eq!(entry.amount, amount("12.30"));
                assert_eq!(entry.user_id, user_id);
                assert_eq!(entry.kind, EntryKind::Expense);
                assert_eq!(entry.description, "weekly shop");
                assert_eq!(entry.source_rule_id, None);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_non_positive_amount() {
        let conn = get_test_connection();
        let category = create_test_category("Groceries", &conn);

        let result = create_entry(
            LedgerEntry::build(
                UserId::new(1),
                EntryKind::Expense,
                Decimal::ZERO,
                category.id,
                date!(2024 - 02 - 15),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount(Decimal::ZERO)));
    }

    #[test]
    fn create_fails_on_invalid_category() {
        let conn = get_test_connection();
        let missing_category_id = 42;

        let result = create_entry(
            LedgerEntry::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("12.30"),
                missing_category_id,
                date!(2024 - 02 - 15),
            ),
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::InvalidCategory(Some(missing_category_id)))
        );
    }

    #[test]
    fn insert_materialized_is_idempotent() {
        let conn = get_test_connection();
        let category = create_test_category("Rent", &conn);
        let user_id = UserId::new(1);
        let rule = create_rule(
            RecurringRule::build(
                user_id,
                EntryKind::Expense,
                amount("1200"),
                category.id,
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .expect("Could not create test rule");

        let builder = LedgerEntry::build(
            user_id,
            EntryKind::Expense,
            amount("1200"),
            category.id,
            date!(2024 - 02 - 15),
        )
        .source_rule(rule.id);

        let first = insert_materialized_entry(builder.clone(), &conn)
            .expect("Could not insert materialized entry");
        let second = insert_materialized_entry(builder, &conn)
            .expect("Second insert should be a no-op, not an error");

        assert!(first.is_some());
        assert_eq!(second, None);

        let entries = get_entries(&LedgerQuery::new(user_id), &conn).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn distinct_rules_with_identical_fields_both_insert() {
        let conn = get_test_connection();
        let category = create_test_category("Subscriptions", &conn);
        let user_id = UserId::new(1);
        let build_rule = || {
            RecurringRule::build(
                user_id,
                EntryKind::Expense,
                amount("9.99"),
                category.id,
                date!(2024 - 01 - 01),
            )
            .description("streaming")
        };
        let rule_one = create_rule(build_rule(), &conn).unwrap();
        let rule_two = create_rule(build_rule(), &conn).unwrap();

        let day = date!(2024 - 02 - 15);
        let build_entry = |rule_id| {
            LedgerEntry::build(user_id, EntryKind::Expense, amount("9.99"), category.id, day)
                .description("streaming")
                .source_rule(rule_id)
        };

        let first = insert_materialized_entry(build_entry(rule_one.id), &conn).unwrap();
        let second = insert_materialized_entry(build_entry(rule_two.id), &conn).unwrap();

        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(
            first.unwrap().source_rule_id,
            Some(rule_one.id),
            "each entry must be attributable to its own rule"
        );
        assert_eq!(second.unwrap().source_rule_id, Some(rule_two.id));
    }

    #[test]
    fn find_materialized_entry_round_trips() {
        let conn = get_test_connection();
        let category = create_test_category("Rent", &conn);
        let user_id = UserId::new(1);
        let rule = create_rule(
            RecurringRule::build(
                user_id,
                EntryKind::Expense,
                amount("1200"),
                category.id,
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();
        let day = date!(2024 - 02 - 15);

        let missing = find_materialized_entry(user_id, rule.id, day, &conn).unwrap();
        assert_eq!(missing, None);

        let inserted = insert_materialized_entry(
            LedgerEntry::build(user_id, EntryKind::Expense, amount("1200"), category.id, day)
                .source_rule(rule.id),
            &conn,
        )
        .unwrap();

        let found = find_materialized_entry(user_id, rule.id, day, &conn).unwrap();
        assert_eq!(found, inserted);
    }

    #[test]
    fn get_entries_filters_by_kind() {
        let conn = get_test_connection();
        let category = create_test_category("Misc", &conn);
        let user_id = UserId::new(1);
        let day = date!(2024 - 03 - 01);

        create_entry(
            LedgerEntry::build(user_id, EntryKind::Income, amount("500"), category.id, day),
            &conn,
        )
        .unwrap();
        create_entry(
            LedgerEntry::build(user_id, EntryKind::Expense, amount("75"), category.id, day),
            &conn,
        )
        .unwrap();

        let mut query = LedgerQuery::new(user_id);
        query.kind = Some(EntryKind::Expense);
        let got = get_entries(&query, &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].kind, EntryKind::Expense);
        assert_eq!(got[0].amount, amount("75"));
    }

    #[test]
    fn get_entries_filters_by_date_range_and_orders_by_date() {
        let conn = get_test_connection();
        let category = create_test_category("Misc", &conn);
        let user_id = UserId::new(1);

        for (index, day) in [
            date!(2024 - 03 - 10),
            date!(2024 - 01 - 05),
            date!(2024 - 02 - 20),
            date!(2023 - 12 - 31),
        ]
        .into_iter()
        .enumerate()
        {
            create_entry(
                LedgerEntry::build(
                    user_id,
                    EntryKind::Expense,
                    amount(&format!("{}", index + 1)),
                    category.id,
                    day,
                ),
                &conn,
            )
            .unwrap();
        }

        let mut query = LedgerQuery::new(user_id);
        query.date_range = Some(date!(2024 - 01 - 01)..=date!(2024 - 02 - 29));
        let got = get_entries(&query, &conn).unwrap();

        let got_dates: Vec<_> = got.iter().map(|entry| entry.date).collect();
        assert_eq!(got_dates, vec![date!(2024 - 01 - 05), date!(2024 - 02 - 20)]);
    }

    #[test]
    fn get_entries_excludes_other_users() {
        let conn = get_test_connection();
        let category = create_test_category("Misc", &conn);
        let day = date!(2024 - 03 - 01);

        create_entry(
            LedgerEntry::build(UserId::new(1), EntryKind::Expense, amount("10"), category.id, day),
            &conn,
        )
        .unwrap();
        create_entry(
            LedgerEntry::build(UserId::new(2), EntryKind::Expense, amount("20"), category.id, day),
            &conn,
        )
        .unwrap();

        let got = get_entries(&LedgerQuery::new(UserId::new(2)), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].user_id, UserId::new(2));
    }
}
