//! Core traits for the external schema and model collaborators.
//!
//! The migration engine consumes two narrow interfaces:
//!
//! - [`SchemaOps`]: DDL execution and column/index introspection, including
//!   the per-table schema cache the engine must invalidate after DDL
//! - [`ModelOps`]: record access for the data-movement passes
//!
//! Implementations wrap a real ORM/connection layer; the crate ships an
//! in-memory implementation for tests ([`crate::backend::MemoryBackend`]).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{Column, ColumnDef, IndexDef, PkValue, Value};

/// One record's worth of attribute values, keyed by attribute name.
pub type AttributeMap = BTreeMap<String, Value>;

/// A record surfaced by the model layer during data movement.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Primary key of the source row.
    pub id: PkValue,

    /// Attribute values, keyed by attribute name.
    pub values: AttributeMap,
}

impl SourceRecord {
    /// Create a record from a primary key and attribute pairs.
    pub fn new(id: impl Into<PkValue>, values: AttributeMap) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }
}

/// DDL execution and schema introspection.
///
/// Column metadata returned by [`columns`](SchemaOps::columns) may be served
/// from a cache; after any DDL the engine calls
/// [`clear_schema_cache`](SchemaOps::clear_schema_cache) for every affected
/// logical table before the next metadata read.
#[async_trait]
pub trait SchemaOps: Send + Sync {
    /// Create a table with the given columns.
    async fn create_table(&self, table: &str, columns: &[ColumnDef]) -> Result<()>;

    /// Drop a table.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Add a column to an existing table.
    async fn add_column(&self, table: &str, column: &ColumnDef) -> Result<()>;

    /// Remove a column from a table.
    async fn remove_column(&self, table: &str, column: &str) -> Result<()>;

    /// Check whether a column exists on a table.
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    /// Current column metadata for a table (possibly cached).
    async fn columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Create an index on a table.
    async fn add_index(&self, table: &str, index: &IndexDef) -> Result<()>;

    /// Remove an index by name.
    async fn remove_index(&self, table: &str, name: &str) -> Result<()>;

    /// Names of the indexes currently present on a table.
    async fn index_names(&self, table: &str) -> Result<Vec<String>>;

    /// Maximum identifier length supported by the database.
    fn max_identifier_len(&self) -> usize;

    /// Invalidate cached column metadata for one logical table.
    async fn clear_schema_cache(&self, table: &str);
}

/// Record access for the data-movement passes.
#[async_trait]
pub trait ModelOps: Send + Sync {
    /// Fetch a batch of source records ordered by primary key.
    ///
    /// Values are raw column values, bypassing any translation layer. `after`
    /// is an exclusive cursor; `None` starts from the beginning.
    async fn fetch_source_batch(
        &self,
        after: Option<&PkValue>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>>;

    /// Find or build the translation row for (record, locale), copy the given
    /// values into it, and persist it.
    ///
    /// A persistence failure must be returned as an error; the engine aborts
    /// the whole pass on the first failure.
    async fn upsert_translation(
        &self,
        id: &PkValue,
        locale: &str,
        values: &AttributeMap,
    ) -> Result<()>;

    /// Fetch a batch of records from the combined record+translation view for
    /// one locale, ordered by primary key.
    async fn fetch_combined_batch(
        &self,
        locale: &str,
        after: Option<&PkValue>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>>;

    /// Bulk-update the source row matching the primary key with the given
    /// values. Returns the number of rows updated.
    async fn update_source_row(&self, id: &PkValue, values: &AttributeMap) -> Result<u64>;
}
