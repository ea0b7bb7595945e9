//! The facade the presentation layer drives the ledger core through.

use std::collections::HashSet;

use rust_decimal::Decimal;
use time::util::days_in_year_month;

use crate::{
    BudgetConfig, CategoryId, Error, UserId,
    aggregation::{self, CategoryTotal, LedgerSummary, MonthlyTotals},
    category::{Category, CategoryName},
    ledger::{EntryKind, LedgerEntry, LedgerEntryBuilder, LedgerQuery},
    materialize::{MaterializationOutcome, materialize},
    rule::{RecurringRule, RuleBuilder},
    stores::{CategoryStore, LedgerStore, RuleStore},
    timezone,
};

/// Exposes the ledger core's operations over injected stores.
///
/// One service instance serves any number of users; every operation is
/// scoped to the `user_id` it is given and no per-user state is held in
/// memory.
#[derive(Debug, Clone)]
pub struct BudgetService<C, L, R>
where
    C: CategoryStore,
    L: LedgerStore,
    R: RuleStore,
{
    category_store: C,
    ledger_store: L,
    rule_store: R,
    config: BudgetConfig,
}

impl<C, L, R> BudgetService<C, L, R>
where
    C: CategoryStore,
    L: LedgerStore,
    R: RuleStore,
{
    /// Create a new service over the given stores.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidTimezone] if the config's
    /// timezone is not a canonical timezone name.
    pub fn new(
        category_store: C,
        ledger_store: L,
        rule_store: R,
        config: BudgetConfig,
    ) -> Result<Self, Error> {
        if timezone::get_local_offset(&config.local_timezone).is_none() {
            return Err(Error::InvalidTimezone(config.local_timezone));
        }

        Ok(Self {
            category_store,
            ledger_store,
            rule_store,
            config,
        })
    }

    /// Materialize the user's active recurring rules for today.
    ///
    /// Intended to be invoked once per session activation, but safe to call
    /// any number of times: entries already materialized for today are
    /// skipped, never duplicated.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the active rules
    /// cannot be listed. Per-rule problems are reported in the outcome
    /// instead.
    pub fn run_materialization(
        &mut self,
        user_id: UserId,
    ) -> Result<MaterializationOutcome, Error> {
        let today = timezone::today_in(&self.config.local_timezone);

        materialize(user_id, today, &self.rule_store, &mut self.ledger_store)
    }

    /// The user's expenses grouped by category.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the entries or
    /// category names cannot be loaded.
    pub fn category_breakdown(&self, user_id: UserId) -> Result<Vec<CategoryTotal>, Error> {
        let mut query = LedgerQuery::new(user_id);
        query.kind = Some(EntryKind::Expense);
        let entries = self.ledger_store.get_query(&query)?;

        let category_ids: Vec<CategoryId> = entries
            .iter()
            .map(|entry| entry.category_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names = self.category_store.resolve_names(&category_ids)?;

        Ok(aggregation::category_breakdown(&entries, &names))
    }

    /// The user's income and expenses aggregated by calendar month, in
    /// chronological order.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the entries cannot
    /// be loaded.
    pub fn monthly_trend(&self, user_id: UserId) -> Result<Vec<MonthlyTotals>, Error> {
        let entries = self.ledger_store.get_query(&LedgerQuery::new(user_id))?;

        Ok(aggregation::monthly_trend(&entries))
    }

    /// The percentage of the configured monthly spending goal consumed by
    /// the current month's expenses.
    ///
    /// The expense total is read directly from the ledger for the current
    /// local month, so the result does not depend on any other view having
    /// been computed first.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingGoal] if no goal is configured,
    /// - [Error::NonPositiveGoal] if the configured goal is zero or negative,
    /// - or [Error::SqlError] if the entries cannot be loaded.
    pub fn goal_progress(&self, user_id: UserId) -> Result<Decimal, Error> {
        let goal = self.config.monthly_spending_goal.ok_or(Error::MissingGoal)?;

        let today = timezone::today_in(&self.config.local_timezone);
        let month_start = today.replace_day(1).unwrap();
        let month_end = today
            .replace_day(days_in_year_month(today.year(), today.month()))
            .unwrap();

        let mut query = LedgerQuery::new(user_id);
        query.kind = Some(EntryKind::Expense);
        query.date_range = Some(month_start..=month_end);
        let entries = self.ledger_store.get_query(&query)?;

        let spent = aggregation::summary(&entries).expense_total;

        aggregation::goal_progress(spent, goal)
    }

    /// Whole-ledger totals for the user's dashboard summary cards.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the entries cannot
    /// be loaded.
    pub fn summary(&self, user_id: UserId) -> Result<LedgerSummary, Error> {
        let entries = self.ledger_store.get_query(&LedgerQuery::new(user_id))?;

        Ok(aggregation::summary(&entries))
    }

    /// Record a manual income or expense entry.
    ///
    /// # Errors
    /// See [LedgerStore::create].
    pub fn add_entry(&mut self, builder: LedgerEntryBuilder) -> Result<LedgerEntry, Error> {
        self.ledger_store.create(builder)
    }

    /// Create a recurring rule.
    ///
    /// # Errors
    /// See [RuleStore::create].
    pub fn add_rule(&mut self, builder: RuleBuilder) -> Result<RecurringRule, Error> {
        self.rule_store.create(builder)
    }

    /// All of the user's recurring rules, oldest first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the rules cannot be
    /// loaded.
    pub fn rules(&self, user_id: UserId) -> Result<Vec<RecurringRule>, Error> {
        self.rule_store.get_for_user(user_id)
    }

    /// Create a category.
    ///
    /// # Errors
    /// See [CategoryStore::create].
    pub fn add_category(&mut self, name: CategoryName) -> Result<Category, Error> {
        self.category_store.create(name)
    }

    /// All categories, ordered alphabetically by name.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if the categories
    /// cannot be loaded.
    pub fn categories(&self) -> Result<Vec<Category>, Error> {
        self.category_store.get_all()
    }
}
