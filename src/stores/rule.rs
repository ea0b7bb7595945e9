//! Defines the recurring rule store trait.

use time::Date;

use crate::{
    Error, UserId,
    rule::{RecurringRule, RuleBuilder},
};

/// Handles the creation and retrieval of recurring rules.
pub trait RuleStore {
    /// Create a new rule in the store.
    fn create(&mut self, builder: RuleBuilder) -> Result<RecurringRule, Error>;

    /// Get all of a user's rules, oldest first.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<RecurringRule>, Error>;

    /// Get the user's rules that are active on `as_of_date`.
    fn get_active(&self, user_id: UserId, as_of_date: Date)
    -> Result<Vec<RecurringRule>, Error>;
}
