//! Core recurring rule domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{CategoryId, Error, RuleId, UserId, ledger::EntryKind, money::validate_amount};

/// The error returned when an integer code does not map to a repeat interval.
#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid repeat interval code")]
pub struct IntervalError(i64);

/// How often a recurring rule nominally repeats.
///
/// The interval describes the rule to the user; due-ness is decided by the
/// rule's date range alone, with the attribution key preventing repeat
/// materialization for a date (see [crate::materialize()]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Interval {
    /// Repeats every day.
    Daily = 0,
    /// Repeats every week.
    Weekly = 1,
    /// Repeats every calendar month.
    Monthly = 2,
}

impl TryFrom<i64> for Interval {
    type Error = IntervalError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Interval::Daily),
            1 => Ok(Interval::Weekly),
            2 => Ok(Interval::Monthly),
            _ => Err(IntervalError(value)),
        }
    }
}

/// A transaction (income or expense) that repeats on a regular basis (e.g.,
/// wages, rent).
///
/// A rule is **active** on date D iff `start_date <= D` and `end_date` is
/// absent or `end_date >= D`. An `end_date` of `None` is interpreted as the
/// rule recurring indefinitely.
///
/// To create a new `RecurringRule`, use [RecurringRule::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    /// The ID of the rule.
    pub id: RuleId,
    /// The user that owns this rule.
    pub user_id: UserId,
    /// Whether materialized entries are income or expenses.
    pub kind: EntryKind,
    /// The ID of the category applied to materialized entries.
    pub category_id: CategoryId,
    /// The amount copied onto each materialized entry.
    pub amount: Decimal,
    /// The description copied onto each materialized entry.
    pub description: String,
    /// How often the rule nominally repeats.
    pub interval: Interval,
    /// The first date the rule is active.
    pub start_date: Date,
    /// The last date the rule is active, or `None` to recur indefinitely.
    pub end_date: Option<Date>,
}

impl RecurringRule {
    /// Create a new recurring rule.
    ///
    /// Shortcut for [RuleBuilder] for discoverability.
    pub fn build(
        user_id: UserId,
        kind: EntryKind,
        amount: Decimal,
        category_id: CategoryId,
        start_date: Date,
    ) -> RuleBuilder {
        RuleBuilder {
            user_id,
            kind,
            amount,
            category_id,
            start_date,
            description: String::new(),
            interval: Interval::Monthly,
            end_date: None,
        }
    }

    /// Whether this rule is active on `date`.
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end_date| end_date >= date)
    }
}

/// A builder for creating [RecurringRule] instances.
///
/// The interval defaults to monthly and the end date to `None` (recur
/// indefinitely), matching the most common rules (rent, wages).
#[derive(Debug, PartialEq, Clone)]
pub struct RuleBuilder {
    /// The user that will own the rule.
    pub user_id: UserId,
    /// Whether materialized entries are income or expenses.
    pub kind: EntryKind,
    /// The amount copied onto each materialized entry. Must be positive.
    pub amount: Decimal,
    /// The ID of the category applied to materialized entries.
    pub category_id: CategoryId,
    /// The first date the rule is active.
    pub start_date: Date,
    /// The description copied onto each materialized entry.
    pub description: String,
    /// How often the rule nominally repeats.
    pub interval: Interval,
    /// The last date the rule is active, or `None` to recur indefinitely.
    pub end_date: Option<Date>,
}

impl RuleBuilder {
    /// Set the description for the rule.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the repeat interval for the rule.
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Set the last date the rule is active.
    pub fn end_date(mut self, end_date: Date) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Check the builder's fields against the rule invariants.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NonPositiveAmount] if the amount is zero or negative,
    /// - or [Error::EndDateBeforeStartDate] if an end date is set earlier
    ///   than the start date.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        validate_amount(self.amount)?;

        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                return Err(Error::EndDateBeforeStartDate {
                    start: self.start_date,
                    end: end_date,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod activity_tests {
    use time::{Duration, macros::date};

    use crate::{UserId, ledger::EntryKind};

    use super::RecurringRule;

    fn create_rule(start: time::Date, end: Option<time::Date>) -> RecurringRule {
        RecurringRule {
            id: 1,
            user_id: UserId::new(1),
            kind: EntryKind::Expense,
            category_id: 2,
            amount: "1200".parse().unwrap(),
            description: "rent".to_string(),
            interval: super::Interval::Monthly,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn rule_is_active_on_start_date_and_not_before() {
        let start = date!(2024 - 01 - 01);
        let rule = create_rule(start, None);

        assert!(rule.is_active_on(start));
        assert!(!rule.is_active_on(start - Duration::days(1)));
    }

    #[test]
    fn rule_is_active_on_end_date_and_not_after() {
        let start = date!(2024 - 01 - 01);
        let end = date!(2024 - 06 - 30);
        let rule = create_rule(start, Some(end));

        assert!(rule.is_active_on(end));
        assert!(!rule.is_active_on(end + Duration::days(1)));
    }

    #[test]
    fn rule_without_end_date_is_active_indefinitely() {
        let start = date!(2024 - 01 - 01);
        let rule = create_rule(start, None);

        assert!(rule.is_active_on(date!(2044 - 01 - 01)));
    }
}
