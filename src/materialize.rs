//! Materialization of recurring rules into dated ledger entries.
//!
//! Materialization runs once per session activation but must tolerate being
//! run any number of times, including concurrently from two open sessions:
//! for every (rule, date) pair where the rule is active, at most one ledger
//! entry may ever exist. The uniqueness lives in the storage layer's
//! attribution key, not in field comparisons: two rules with identical
//! amount, category, and description still materialize independently.

use time::Date;

use crate::{
    Error, RuleId, UserId,
    ledger::{LedgerEntry, LedgerEntryBuilder},
    money::validate_amount,
    rule::RecurringRule,
    stores::{LedgerStore, RuleStore},
};

/// The result of one materialization pass.
#[derive(Debug, Default)]
pub struct MaterializationOutcome {
    /// Entries created by this pass, in rule order.
    pub created: Vec<LedgerEntry>,
    /// The number of active rules that already had an entry for the date.
    pub skipped: u32,
    /// Rules that could not be materialized, with the reason for each.
    ///
    /// A failed rule never prevents the remaining rules from materializing.
    pub failures: Vec<RuleFailure>,
}

/// A rule the materializer had to give up on, and why.
#[derive(Debug, PartialEq)]
pub struct RuleFailure {
    /// The ID of the rule that failed.
    pub rule_id: RuleId,
    /// What went wrong for this rule.
    pub error: Error,
}

/// Ensure every rule active on `as_of_date` has exactly one ledger entry for
/// that date, creating the missing ones.
///
/// Rules that fail validation (e.g. a non-positive amount on a legacy row) or
/// whose inserts fail are reported per rule in the outcome; only a failure to
/// list the active rules aborts the pass.
///
/// Calling this any number of times for the same `(user_id, as_of_date)`
/// leaves the ledger in the same state as calling it once.
///
/// # Errors
/// This function will return an [Error::SqlError] if the rule store cannot
/// list the user's active rules.
pub fn materialize<R, L>(
    user_id: UserId,
    as_of_date: Date,
    rule_store: &R,
    ledger_store: &mut L,
) -> Result<MaterializationOutcome, Error>
where
    R: RuleStore,
    L: LedgerStore,
{
    let rules = rule_store.get_active(user_id, as_of_date)?;

    let mut outcome = MaterializationOutcome::default();

    for rule in rules {
        match materialize_rule(&rule, as_of_date, ledger_store) {
            Ok(Some(entry)) => outcome.created.push(entry),
            Ok(None) => outcome.skipped += 1,
            Err(error) => {
                tracing::warn!("Could not materialize rule {}: {}", rule.id, error);
                outcome.failures.push(RuleFailure {
                    rule_id: rule.id,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        "Materialized {} entries for user {} on {} ({} skipped, {} failed)",
        outcome.created.len(),
        user_id,
        as_of_date,
        outcome.skipped,
        outcome.failures.len()
    );

    Ok(outcome)
}

/// Materialize a single rule, returning `None` if the date already has an
/// entry for it.
fn materialize_rule<L>(
    rule: &RecurringRule,
    as_of_date: Date,
    ledger_store: &mut L,
) -> Result<Option<LedgerEntry>, Error>
where
    L: LedgerStore,
{
    validate_amount(rule.amount)?;

    if ledger_store
        .find_materialized(rule.user_id, rule.id, as_of_date)?
        .is_some()
    {
        return Ok(None);
    }

    let builder = entry_from_rule(rule, as_of_date);

    // A concurrent run may insert between the check above and here; the
    // store's attribution constraint turns that into Ok(None).
    ledger_store.insert_materialized(builder)
}

/// The ledger entry a rule produces for `date`.
fn entry_from_rule(rule: &RecurringRule, date: Date) -> LedgerEntryBuilder {
    LedgerEntry::build(rule.user_id, rule.kind, rule.amount, rule.category_id, date)
        .description(&rule.description)
        .source_rule(rule.id)
}
