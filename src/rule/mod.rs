//! Recurring transaction rules.
//!
//! A rule is a template that, while active, should produce one ledger entry
//! per day the materializer runs. Rules are created by the user and are
//! read-only to the materializer.

mod db;
mod models;

pub use db::{create_rule, create_rule_table, get_active_rules, get_rule, get_rules_for_user};
pub use models::{Interval, IntervalError, RecurringRule, RuleBuilder};
