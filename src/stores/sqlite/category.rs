//! Implements a SQLite backed category store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::Connection;

use crate::{
    CategoryId, Error,
    category::{
        Category, CategoryName, create_category, get_all_categories, get_category,
        resolve_category_names,
    },
    stores::CategoryStore,
};

/// Stores categories in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl CategoryStore for SQLiteCategoryStore {
    fn create(&mut self, name: CategoryName) -> Result<Category, Error> {
        create_category(name, &*self.connection()?)
    }

    fn get(&self, category_id: CategoryId) -> Result<Category, Error> {
        get_category(category_id, &*self.connection()?)
    }

    fn get_all(&self) -> Result<Vec<Category>, Error> {
        get_all_categories(&*self.connection()?)
    }

    fn resolve_names(
        &self,
        ids: &[CategoryId],
    ) -> Result<HashMap<CategoryId, CategoryName>, Error> {
        resolve_category_names(ids, &*self.connection()?)
    }
}
