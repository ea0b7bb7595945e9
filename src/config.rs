//! Runtime configuration for the ledger core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The settings the consuming application supplies to a
/// [BudgetService](crate::BudgetService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// The monthly spending goal that goal progress is measured against.
    ///
    /// `None` means no goal has been configured; asking for goal progress
    /// then fails with [Error::MissingGoal](crate::Error::MissingGoal)
    /// instead of reporting a misleading zero.
    pub monthly_spending_goal: Option<Decimal>,

    /// The local timezone as a canonical timezone name, e.g.
    /// "Pacific/Auckland".
    ///
    /// Materialization and goal progress resolve "today" in this timezone.
    pub local_timezone: String,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_spending_goal: None,
            local_timezone: "UTC".to_string(),
        }
    }
}
