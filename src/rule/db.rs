//! Database operations for recurring rules.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error, RuleId, UserId,
    ledger::EntryKind,
    money::{amount_from_row, amount_to_sql},
    rule::models::{Interval, RecurringRule, RuleBuilder},
};

const RULE_COLUMNS: &str =
    "id, user_id, kind, category_id, amount, description, repeat_interval, start_date, end_date";

/// Create a rule in the database and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the builder's amount is zero or negative,
/// - [Error::EndDateBeforeStartDate] if the builder's end date is earlier
///   than its start date,
/// - [Error::InvalidCategory] if the builder's category ID does not refer to
///   a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_rule(builder: RuleBuilder, connection: &Connection) -> Result<RecurringRule, Error> {
    builder.validate()?;

    connection
        .execute(
            "INSERT INTO recurring_rule \
                (user_id, kind, category_id, amount, description, repeat_interval, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            (
                builder.user_id.as_i64(),
                builder.kind as i64,
                builder.category_id,
                amount_to_sql(builder.amount),
                &builder.description,
                builder.interval as i64,
                builder.start_date,
                builder.end_date,
            ),
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

    let id = connection.last_insert_rowid();

    Ok(RecurringRule {
        id,
        user_id: builder.user_id,
        kind: builder.kind,
        category_id: builder.category_id,
        amount: builder.amount,
        description: builder.description,
        interval: builder.interval,
        start_date: builder.start_date,
        end_date: builder.end_date,
    })
}

/// Retrieve a rule in the database by `rule_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `rule_id` does not refer to a valid rule,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_rule(rule_id: RuleId, connection: &Connection) -> Result<RecurringRule, Error> {
    let query = format!("SELECT {RULE_COLUMNS} FROM recurring_rule WHERE id = :id;");

    connection
        .prepare(&query)?
        .query_row(&[(":id", &rule_id)], map_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve all of a user's rules, oldest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_rules_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<RecurringRule>, Error> {
    let query =
        format!("SELECT {RULE_COLUMNS} FROM recurring_rule WHERE user_id = ?1 ORDER BY id ASC;");

    connection
        .prepare(&query)?
        .query_map([user_id.as_i64()], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's rules that are active on `as_of_date`.
///
/// A rule is active iff its start date is on or before `as_of_date` and its
/// end date is absent or on or after `as_of_date`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_active_rules(
    user_id: UserId,
    as_of_date: Date,
    connection: &Connection,
) -> Result<Vec<RecurringRule>, Error> {
    let query = format!(
        "SELECT {RULE_COLUMNS} FROM recurring_rule
         WHERE user_id = ?1
           AND start_date <= ?2
           AND (end_date IS NULL OR end_date >= ?2)
         ORDER BY id ASC;"
    );

    connection
        .prepare(&query)?
        .query_map((user_id.as_i64(), as_of_date), map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Create the recurring rule table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                description TEXT NOT NULL,
                repeat_interval INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                FOREIGN KEY(category_id) REFERENCES category(id)
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('recurring_rule', 0)",
        (),
    )?;

    // Composite index used by the materializer's active-rule query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_user_start
         ON recurring_rule(user_id, start_date);",
        (),
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<RecurringRule, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let kind_code: i64 = row.get(2)?;
    let kind = EntryKind::try_from(kind_code).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(error))
    })?;
    let category_id = row.get(3)?;
    let amount = amount_from_row(row, 4)?;
    let description = row.get(5)?;
    let interval_code: i64 = row.get(6)?;
    let interval = Interval::try_from(interval_code).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Integer, Box::new(error))
    })?;
    let start_date = row.get(7)?;
    let end_date = row.get(8)?;

    Ok(RecurringRule {
        id,
        user_id,
        kind,
        category_id,
        amount,
        description,
        interval,
        start_date,
        end_date,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{Duration, macros::date};

    use crate::{
        Error, UserId,
        category::{Category, CategoryName, create_category},
        db::initialize,
        ledger::EntryKind,
        rule::models::{Interval, RecurringRule},
    };

    use super::{create_rule, get_active_rules, get_rule, get_rules_for_user};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_category(conn: &Connection) -> Category {
        create_category(CategoryName::new_unchecked("Rent"), conn)
            .expect("Could not create test category")
    }

    fn amount(text: &str) -> Decimal {
        text.parse().expect("Could not parse test amount")
    }

    #[test]
    fn create_rule_succeeds() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);

        let rule = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                category.id,
                date!(2024 - 01 - 01),
            )
            .description("monthly rent")
            .interval(Interval::Monthly),
            &conn,
        );

        let got_rule = rule.expect("Could not create rule");
        assert!(got_rule.id > 0);
        assert_eq!(got_rule.amount, amount("1200"));
        assert_eq!(got_rule.interval, Interval::Monthly);
        assert_eq!(got_rule.end_date, None);
    }

    #[test]
    fn create_rule_fails_on_non_positive_amount() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);

        let result = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                Decimal::ZERO,
                category.id,
                date!(2024 - 01 - 01),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount(Decimal::ZERO)));
    }

    #[test]
    fn create_rule_fails_on_end_date_before_start_date() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let start = date!(2024 - 01 - 01);
        let end = date!(2023 - 12 - 01);

        let result = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                category.id,
                start,
            )
            .end_date(end),
            &conn,
        );

        assert_eq!(result, Err(Error::EndDateBeforeStartDate { start, end }));
    }

    #[test]
    fn create_rule_fails_on_invalid_category() {
        let conn = get_test_connection();
        let missing_category_id = 42;

        let result = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                missing_category_id,
                date!(2024 - 01 - 01),
            ),
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::InvalidCategory(Some(missing_category_id)))
        );
    }

    #[test]
    fn get_rule_round_trips() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let inserted = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Income,
                amount("3500.50"),
                category.id,
                date!(2024 - 01 - 15),
            )
            .description("wages")
            .interval(Interval::Weekly)
            .end_date(date!(2025 - 01 - 15)),
            &conn,
        )
        .expect("Could not create test rule");

        let selected = get_rule(inserted.id, &conn);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_rule_with_invalid_id_returns_not_found() {
        let conn = get_test_connection();

        let selected = get_rule(999999, &conn);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_rules_for_user_excludes_other_users() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let build = |user_id| {
            RecurringRule::build(
                user_id,
                EntryKind::Expense,
                amount("10"),
                category.id,
                date!(2024 - 01 - 01),
            )
        };
        let mine = create_rule(build(UserId::new(1)), &conn).unwrap();
        create_rule(build(UserId::new(2)), &conn).unwrap();

        let got = get_rules_for_user(UserId::new(1), &conn).unwrap();

        assert_eq!(got, vec![mine]);
    }

    #[test]
    fn active_rules_respect_start_date_boundary() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let start = date!(2024 - 02 - 15);
        let rule = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                category.id,
                start,
            ),
            &conn,
        )
        .unwrap();

        let on_start = get_active_rules(UserId::new(1), start, &conn).unwrap();
        let day_before = get_active_rules(UserId::new(1), start - Duration::days(1), &conn).unwrap();

        assert_eq!(on_start, vec![rule]);
        assert!(day_before.is_empty());
    }

    #[test]
    fn active_rules_respect_end_date_boundary() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let end = date!(2024 - 06 - 30);
        let rule = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                category.id,
                date!(2024 - 01 - 01),
            )
            .end_date(end),
            &conn,
        )
        .unwrap();

        let on_end = get_active_rules(UserId::new(1), end, &conn).unwrap();
        let day_after = get_active_rules(UserId::new(1), end + Duration::days(1), &conn).unwrap();

        assert_eq!(on_end, vec![rule]);
        assert!(day_after.is_empty());
    }

    #[test]
    fn active_rules_include_open_ended_rules() {
        let conn = get_test_connection();
        let category = create_test_category(&conn);
        let rule = create_rule(
            RecurringRule::build(
                UserId::new(1),
                EntryKind::Expense,
                amount("1200"),
                category.id,
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        let far_future = get_active_rules(UserId::new(1), date!(2044 - 01 - 01), &conn).unwrap();

        assert_eq!(far_future, vec![rule]);
    }
}
