//! The table registry a resolution context points at.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::saved_query::validate_saved_query_name;
use super::field::DatabaseField;
use super::table::Table;
use crate::error::{SchemaError, SchemaResult};

/// Logical table name → shared table, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: IndexMap<String, Arc<Table>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a table under `name`.
    pub fn add_table(&mut self, name: &str, table: impl Into<Arc<Table>>) {
        debug!(table = %name, "registering table");
        self.tables.insert(name.to_string(), table.into());
    }

    /// Register a saved query exposing `columns`. The name must pass
    /// validation and must not shadow an existing table.
    pub fn add_saved_query(&mut self, name: &str, query: &str, columns: Vec<DatabaseField>) -> SchemaResult<()> {
        validate_saved_query_name(name)?;
        if self.tables.contains_key(name) {
            return Err(SchemaError::InvalidSavedQueryName {
                name: name.to_string(),
                reason: "a table with this name already exists".to_string(),
            });
        }
        let table = columns
            .into_iter()
            .fold(Table::saved_query(name, query), |builder, column| {
                let key = column.name.clone();
                builder.field(&key, column)
            })
            .build();
        self.add_table(name, table);
        Ok(())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn get_table(&self, name: &str) -> SchemaResult<Arc<Table>> {
        trace!(table = %name, "registry lookup");
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &Arc<Table>)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
