//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Identifier of a ledger entry row.
pub type EntryId = DatabaseId;

/// Identifier of a recurring rule row.
pub type RuleId = DatabaseId;

/// Identifier of a category row.
pub type CategoryId = DatabaseId;
