//! Helpers for storing and validating monetary amounts.
//!
//! Amounts are fixed-point decimals stored as canonical strings in SQLite so
//! that repeated aggregation does not accumulate floating-point drift.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

use crate::Error;

/// Serialize an amount for storage in a TEXT column.
pub(crate) fn amount_to_sql(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Read a decimal amount from a TEXT column at `index`.
pub(crate) fn amount_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Check that `amount` is strictly positive.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if `amount` is zero or negative.
pub(crate) fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        Err(Error::NonPositiveAmount(amount))
    } else {
        Ok(amount)
    }
}
