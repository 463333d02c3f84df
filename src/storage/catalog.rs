//! Table registry: resolves a [`TableId`] to its page store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::common::{Error, Result, TableId};
use crate::storage::PageStore;

/// Registry of the page stores the buffer pool can read and write.
///
/// Shared between the pool and its callers as `Arc<Catalog>`; tables can
/// be registered while the pool is running.
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, Arc<dyn PageStore>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any store with the same id.
    pub fn add_table(&self, store: Arc<dyn PageStore>) -> TableId {
        let table_id = store.table_id();
        debug!(%table_id, desc = %store.tuple_desc(), "registered table");
        self.tables.write().insert(table_id, store);
        table_id
    }

    /// The page store for `table_id`.
    ///
    /// # Errors
    /// Returns `Error::TableNotFound` if no such table is registered.
    pub fn get(&self, table_id: TableId) -> Result<Arc<dyn PageStore>> {
        self.tables
            .read()
            .get(&table_id)
            .cloned()
            .ok_or(Error::TableNotFound(table_id))
    }

    /// Ids of all registered tables, in no particular order.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().keys().copied().collect()
    }
}
