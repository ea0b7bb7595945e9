//! Family Budget is the ledger core of a personal/family budget tracker.
//!
//! This library materializes recurring transaction rules into dated ledger
//! entries (exactly once per rule per day) and folds a user's ledger into
//! aggregate views: category breakdown, monthly trend, summary totals, and
//! goal progress. Authentication, routing, and rendering belong to the
//! consuming application and are not part of this crate.

#![warn(missing_docs)]

use rust_decimal::Decimal;
use time::Date;

pub mod aggregation;
pub mod category;
mod config;
mod database_id;
pub mod db;
pub mod ledger;
mod materialize;
mod money;
pub mod rule;
mod service;
pub mod stores;
pub mod timezone;
mod user;

pub use config::BudgetConfig;
pub use database_id::{CategoryId, DatabaseId, EntryId, RuleId};
pub use db::initialize as initialize_db;
pub use materialize::{MaterializationOutcome, RuleFailure, materialize};
pub use service::BudgetService;
pub use user::UserId;

/// The errors that may occur in the ledger core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    ///
    /// The caller may retry the operation; this crate never retries
    /// internally.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The category ID used to create an entry or rule did not match a valid
    /// category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// A zero or negative amount was used for an entry or rule.
    ///
    /// Ledger amounts are always positive; the entry kind records whether
    /// money came in or went out.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(Decimal),

    /// A rule's end date was set before its start date.
    #[error("the end date {end} is before the start date {start}")]
    EndDateBeforeStartDate {
        /// The first date the rule is active.
        start: Date,
        /// The offending last active date.
        end: Date,
    },

    /// No monthly spending goal has been configured.
    ///
    /// Goal progress is reported as unavailable rather than a misleading
    /// zero, so callers must supply a goal before asking for progress.
    #[error("no monthly spending goal is configured")]
    MissingGoal,

    /// The configured monthly spending goal is zero or negative.
    #[error("{0} is not a valid monthly spending goal")]
    NonPositiveGoal(Decimal),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
