//! Ledger entry aggregation for the presentation layer's summary views.
//!
//! Provides pure functions to group expenses by category, aggregate income
//! and expenses by month, total a ledger, and compute spending goal
//! progress. All functions work on an in-memory snapshot of entries and
//! never touch a store.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    CategoryId, Error,
    category::CategoryName,
    ledger::{EntryKind, LedgerEntry},
};

/// The bucket label for expenses whose category ID cannot be resolved to a
/// name. Always sorted after the named categories.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// An expense total for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The name of the category, or [UNCATEGORIZED_LABEL].
    pub name: String,
    /// The summed amount of the category's expense entries.
    pub total: Decimal,
}

/// Income and expense totals for a single calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// The month, represented as its first day.
    pub month: Date,
    /// The summed amount of the month's income entries.
    pub income: Decimal,
    /// The summed amount of the month's expense entries.
    pub expense: Decimal,
}

impl MonthlyTotals {
    /// The month formatted for chart axes, e.g. "Jan 2024".
    pub fn label(&self) -> String {
        format!("{} {}", month_abbreviation(self.month.month()), self.month.year())
    }
}

/// Whole-ledger totals for the dashboard summary cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// The summed amount of all income entries.
    pub income_total: Decimal,
    /// The summed amount of all expense entries.
    pub expense_total: Decimal,
    /// Income minus expenses.
    pub balance: Decimal,
}

/// Groups expense entries by category and sums their amounts.
///
/// Only expense entries contribute; income is ignored. Entries whose
/// category ID is missing from `names` are grouped under
/// [UNCATEGORIZED_LABEL]. Categories are sorted alphabetically with the
/// uncategorized bucket last, so the sum over the returned totals always
/// equals the sum over all expense entries.
pub fn category_breakdown(
    entries: &[LedgerEntry],
    names: &HashMap<CategoryId, CategoryName>,
) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();

    for entry in entries.iter().filter(|entry| entry.kind == EntryKind::Expense) {
        let name = names
            .get(&entry.category_id)
            .map(|name| name.as_ref())
            .unwrap_or(UNCATEGORIZED_LABEL);

        *totals.entry(name).or_insert(Decimal::ZERO) += entry.amount;
    }

    // Sort category names, with the uncategorized bucket at the end
    let mut sorted_names: Vec<&str> = totals
        .keys()
        .copied()
        .filter(|&name| name != UNCATEGORIZED_LABEL)
        .collect();
    sorted_names.sort();

    if totals.contains_key(UNCATEGORIZED_LABEL) {
        sorted_names.push(UNCATEGORIZED_LABEL);
    }

    sorted_names
        .into_iter()
        .map(|name| CategoryTotal {
            name: name.to_owned(),
            total: totals[name],
        })
        .collect()
}

/// Aggregates income and expense amounts by calendar month.
///
/// Each entry's month is derived from its effective `date`, not from when
/// the row was created, so back-dated materialized entries land in the month
/// they belong to. Months with no activity are omitted.
///
/// # Returns
/// One [MonthlyTotals] per month with activity, in chronological order.
pub fn monthly_trend(entries: &[LedgerEntry]) -> Vec<MonthlyTotals> {
    let mut totals: HashMap<Date, (Decimal, Decimal)> = HashMap::new();

    for entry in entries {
        let month = entry.date.replace_day(1).unwrap();
        let (income, expense) = totals.entry(month).or_insert((Decimal::ZERO, Decimal::ZERO));

        match entry.kind {
            EntryKind::Income => *income += entry.amount,
            EntryKind::Expense => *expense += entry.amount,
        }
    }

    let mut sorted_months: Vec<Date> = totals.keys().copied().collect();
    sorted_months.sort();

    sorted_months
        .into_iter()
        .map(|month| {
            let (income, expense) = totals[&month];
            MonthlyTotals {
                month,
                income,
                expense,
            }
        })
        .collect()
}

/// Totals a user's ledger for the dashboard summary cards.
pub fn summary(entries: &[LedgerEntry]) -> LedgerSummary {
    let mut income_total = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;

    for entry in entries {
        match entry.kind {
            EntryKind::Income => income_total += entry.amount,
            EntryKind::Expense => expense_total += entry.amount,
        }
    }

    LedgerSummary {
        income_total,
        expense_total,
        balance: income_total - expense_total,
    }
}

/// The percentage of the monthly spending goal consumed by
/// `current_month_expenses`.
///
/// The result keeps full precision and is not clamped: spending over the
/// goal reports more than 100%. Use [display_percentage] when formatting for
/// display.
///
/// # Errors
/// This function will return an [Error::NonPositiveGoal] if `goal` is zero
/// or negative.
pub fn goal_progress(current_month_expenses: Decimal, goal: Decimal) -> Result<Decimal, Error> {
    if goal <= Decimal::ZERO {
        return Err(Error::NonPositiveGoal(goal));
    }

    Ok(Decimal::ONE_HUNDRED * current_month_expenses / goal)
}

/// Round a percentage to one decimal place for display.
pub fn display_percentage(percentage: Decimal) -> Decimal {
    percentage.round_dp(1)
}

/// Formats a month as its three-letter abbreviation.
fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
