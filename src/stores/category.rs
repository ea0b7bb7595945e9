//! Defines the category store trait.

use std::collections::HashMap;

use crate::{
    CategoryId, Error,
    category::{Category, CategoryName},
};

/// Creates and retrieves the categories that entries and rules refer to.
pub trait CategoryStore {
    /// Create a new category and add it to the store.
    fn create(&mut self, name: CategoryName) -> Result<Category, Error>;

    /// Get a category by its ID.
    fn get(&self, category_id: CategoryId) -> Result<Category, Error>;

    /// Get all categories, ordered alphabetically by name.
    fn get_all(&self) -> Result<Vec<Category>, Error>;

    /// Resolve category IDs to their names.
    ///
    /// IDs that do not refer to an existing category are absent from the
    /// returned map.
    fn resolve_names(&self, ids: &[CategoryId])
    -> Result<HashMap<CategoryId, CategoryName>, Error>;
}
