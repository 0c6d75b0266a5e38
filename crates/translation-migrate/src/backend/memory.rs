//! In-memory schema and model backend.
//!
//! Implements both collaborator traits over mutex-guarded state, primarily
//! for tests and examples. Two behaviors are modeled faithfully because the
//! engine's correctness depends on them:
//!
//! - **Schema cache**: [`columns`](crate::SchemaOps::columns) serves a
//!   snapshot taken at first read. DDL mutates live state only, so metadata
//!   goes stale until `clear_schema_cache` evicts the snapshot.
//! - **Unique indexes**: inserting a second translation row for the same
//!   (foreign key, locale) pair fails when a unique index covers the table.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::core::schema::{Column, ColumnDef, IndexDef, PkValue, Value};
use crate::core::traits::{AttributeMap, ModelOps, SchemaOps, SourceRecord};
use crate::error::{MigrateError, Result};

/// PostgreSQL's identifier limit, a common default for tests.
const DEFAULT_MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Default)]
struct TableState {
    columns: Vec<Column>,
    indexes: Vec<IndexDef>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, TableState>,
    /// Cached column snapshots served by `columns()` until evicted.
    cache: BTreeMap<String, Vec<Column>>,
    /// Source rows by primary key.
    source_rows: BTreeMap<PkValue, AttributeMap>,
    /// Translation rows by (foreign key, locale).
    translation_rows: BTreeMap<(PkValue, String), AttributeMap>,
    /// Remaining upserts before a forced failure (test hook).
    fail_upserts_after: Option<usize>,
}

/// In-memory backend implementing [`SchemaOps`] and [`ModelOps`].
///
/// Cloning shares the underlying state, so one backend can serve as both
/// collaborators of a [`Migrator`](crate::Migrator).
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    source_table: String,
    translation_table: String,
    max_identifier_len: usize,
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Create a backend for one source table and its translation table.
    pub fn new(source_table: impl Into<String>, translation_table: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            translation_table: translation_table.into(),
            max_identifier_len: DEFAULT_MAX_IDENTIFIER_LEN,
            inner: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Override the identifier-length limit reported to the engine.
    pub fn with_max_identifier_len(mut self, limit: usize) -> Self {
        self.max_identifier_len = limit;
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register the source table's columns without going through DDL.
    pub fn seed_source_table(&self, columns: Vec<Column>) {
        self.state().tables.insert(
            self.source_table.clone(),
            TableState {
                columns,
                indexes: Vec::new(),
            },
        );
    }

    /// Insert a source row directly.
    pub fn insert_source_row(&self, id: impl Into<PkValue>, values: AttributeMap) {
        self.state().source_rows.insert(id.into(), values);
    }

    /// Insert a translation row directly, as raw storage would.
    ///
    /// Fails when a unique index covers the translation table and a row for
    /// the same (foreign key, locale) pair already exists.
    pub fn insert_translation_row(
        &self,
        id: impl Into<PkValue>,
        locale: &str,
        values: AttributeMap,
    ) -> Result<()> {
        let id = id.into();
        let mut state = self.state();
        let has_unique = state
            .tables
            .get(&self.translation_table)
            .map(|t| t.indexes.iter().any(|i| i.is_unique))
            .unwrap_or(false);
        let key = (id, locale.to_string());
        if has_unique && state.translation_rows.contains_key(&key) {
            return Err(MigrateError::schema(
                self.translation_table.as_str(),
                format!("duplicate key violates unique index for locale `{locale}`"),
            ));
        }
        state.translation_rows.insert(key, values);
        Ok(())
    }

    /// Force the next upsert (after `n` successful ones) to fail.
    pub fn fail_upserts_after(&self, n: usize) {
        self.state().fail_upserts_after = Some(n);
    }

    /// Whether a table currently exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.state().tables.contains_key(table)
    }

    /// Snapshot of all translation rows, keyed by (foreign key, locale).
    pub fn translation_rows(&self) -> BTreeMap<(PkValue, String), AttributeMap> {
        self.state().translation_rows.clone()
    }

    /// Snapshot of all source rows, keyed by primary key.
    pub fn source_rows(&self) -> BTreeMap<PkValue, AttributeMap> {
        self.state().source_rows.clone()
    }

    /// Live (uncached) column names of a table.
    pub fn live_column_names(&self, table: &str) -> Vec<String> {
        self.state()
            .tables
            .get(table)
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    fn def_to_column(def: &ColumnDef) -> Column {
        Column {
            name: def.name.clone(),
            column_type: def.column_type,
            limit: def.modifiers.limit,
            precision: def.modifiers.precision,
            scale: def.modifiers.scale,
            is_nullable: def.modifiers.nullable.unwrap_or(true),
            default: def.modifiers.default.clone(),
        }
    }

    fn table<'a>(state: &'a MemoryState, table: &str) -> Result<&'a TableState> {
        state
            .tables
            .get(table)
            .ok_or_else(|| MigrateError::schema(table, "table does not exist"))
    }

    fn table_mut<'a>(state: &'a mut MemoryState, table: &str) -> Result<&'a mut TableState> {
        state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::schema(table, "table does not exist"))
    }
}

#[async_trait]
impl SchemaOps for MemoryBackend {
    async fn create_table(&self, table: &str, columns: &[ColumnDef]) -> Result<()> {
        let mut state = self.state();
        if state.tables.contains_key(table) {
            return Err(MigrateError::schema(table, "table already exists"));
        }
        state.tables.insert(
            table.to_string(),
            TableState {
                columns: columns.iter().map(Self::def_to_column).collect(),
                indexes: Vec::new(),
            },
        );
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let mut state = self.state();
        if state.tables.remove(table).is_none() {
            return Err(MigrateError::schema(table, "table does not exist"));
        }
        if table == self.translation_table {
            state.translation_rows.clear();
        }
        Ok(())
    }

    async fn add_column(&self, table: &str, column: &ColumnDef) -> Result<()> {
        let mut state = self.state();
        let t = Self::table_mut(&mut state, table)?;
        if t.columns.iter().any(|c| c.name == column.name) {
            return Err(MigrateError::schema(
                table,
                format!("column `{}` already exists", column.name),
            ));
        }
        t.columns.push(Self::def_to_column(column));
        Ok(())
    }

    async fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        let mut state = self.state();
        let t = Self::table_mut(&mut state, table)?;
        let before = t.columns.len();
        t.columns.retain(|c| c.name != column);
        if t.columns.len() == before {
            return Err(MigrateError::schema(
                table,
                format!("column `{column}` does not exist"),
            ));
        }
        if table == self.source_table {
            for row in state.source_rows.values_mut() {
                row.remove(column);
            }
        }
        Ok(())
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let state = self.state();
        Ok(Self::table(&state, table)?
            .columns
            .iter()
            .any(|c| c.name == column))
    }

    async fn columns(&self, table: &str) -> Result<Vec<Column>> {
        let mut state = self.state();
        if let Some(cached) = state.cache.get(table) {
            return Ok(cached.clone());
        }
        let columns = Self::table(&state, table)?.columns.clone();
        state.cache.insert(table.to_string(), columns.clone());
        Ok(columns)
    }

    async fn add_index(&self, table: &str, index: &IndexDef) -> Result<()> {
        let mut state = self.state();
        let t = Self::table_mut(&mut state, table)?;
        if t.indexes.iter().any(|i| i.name == index.name) {
            return Err(MigrateError::schema(
                table,
                format!("index `{}` already exists", index.name),
            ));
        }
        t.indexes.push(index.clone());
        Ok(())
    }

    async fn remove_index(&self, table: &str, name: &str) -> Result<()> {
        let mut state = self.state();
        let t = Self::table_mut(&mut state, table)?;
        let before = t.indexes.len();
        t.indexes.retain(|i| i.name != name);
        if t.indexes.len() == before {
            return Err(MigrateError::schema(
                table,
                format!("index `{name}` does not exist"),
            ));
        }
        Ok(())
    }

    async fn index_names(&self, table: &str) -> Result<Vec<String>> {
        let state = self.state();
        Ok(Self::table(&state, table)?
            .indexes
            .iter()
            .map(|i| i.name.clone())
            .collect())
    }

    fn max_identifier_len(&self) -> usize {
        self.max_identifier_len
    }

    async fn clear_schema_cache(&self, table: &str) {
        self.state().cache.remove(table);
    }
}

#[async_trait]
impl ModelOps for MemoryBackend {
    async fn fetch_source_batch(
        &self,
        after: Option<&PkValue>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>> {
        let state = self.state();
        let lower = match after {
            Some(pk) => Bound::Excluded(pk.clone()),
            None => Bound::Unbounded,
        };
        Ok(state
            .source_rows
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, values)| SourceRecord {
                id: id.clone(),
                values: values.clone(),
            })
            .collect())
    }

    async fn upsert_translation(
        &self,
        id: &PkValue,
        locale: &str,
        values: &AttributeMap,
    ) -> Result<()> {
        let mut state = self.state();
        if !state.tables.contains_key(&self.translation_table) {
            return Err(MigrateError::schema(
                self.translation_table.as_str(),
                "table does not exist",
            ));
        }
        if let Some(remaining) = state.fail_upserts_after.as_mut() {
            if *remaining == 0 {
                return Err(MigrateError::data_move(
                    self.translation_table.as_str(),
                    format!("failed to persist translation row for locale `{locale}`"),
                ));
            }
            *remaining -= 1;
        }
        let row = state
            .translation_rows
            .entry((id.clone(), locale.to_string()))
            .or_default();
        for (name, value) in values {
            row.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    async fn fetch_combined_batch(
        &self,
        locale: &str,
        after: Option<&PkValue>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>> {
        let state = self.state();
        let lower = match after {
            Some(pk) => Bound::Excluded(pk.clone()),
            None => Bound::Unbounded,
        };
        Ok(state
            .source_rows
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, values)| {
                let mut combined = values.clone();
                let key = (id.clone(), locale.to_string());
                if let Some(translated) = state.translation_rows.get(&key) {
                    for (name, value) in translated {
                        if !matches!(value, Value::Null) {
                            combined.insert(name.clone(), value.clone());
                        }
                    }
                }
                SourceRecord {
                    id: id.clone(),
                    values: combined,
                }
            })
            .collect())
    }

    async fn update_source_row(&self, id: &PkValue, values: &AttributeMap) -> Result<u64> {
        let mut state = self.state();
        match state.source_rows.get_mut(id) {
            Some(row) => {
                for (name, value) in values {
                    row.insert(name.clone(), value.clone());
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnType;

    fn backend() -> MemoryBackend {
        MemoryBackend::new("posts", "post_translations")
    }

    #[tokio::test]
    async fn test_columns_served_from_cache_until_cleared() {
        let b = backend();
        b.create_table("posts", &[ColumnDef::new("id", ColumnType::BigInt)])
            .await
            .unwrap();

        // First read primes the cache
        assert_eq!(b.columns("posts").await.unwrap().len(), 1);

        b.add_column("posts", &ColumnDef::new("title", ColumnType::String))
            .await
            .unwrap();

        // Stale until the cache is cleared
        assert_eq!(b.columns("posts").await.unwrap().len(), 1);
        b.clear_schema_cache("posts").await;
        assert_eq!(b.columns("posts").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_locale_pair() {
        let b = backend();
        b.create_table("post_translations", &[])
            .await
            .unwrap();
        b.add_index(
            "post_translations",
            &IndexDef {
                name: "uniq".to_string(),
                columns: vec!["post_id".to_string(), "locale".to_string()],
                is_unique: true,
            },
        )
        .await
        .unwrap();

        assert!(b.insert_translation_row(1i64, "en", AttributeMap::new()).is_ok());
        assert!(b.insert_translation_row(1i64, "en", AttributeMap::new()).is_err());
        assert!(b.insert_translation_row(1i64, "de", AttributeMap::new()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_source_batch_is_cursor_ordered() {
        let b = backend();
        for id in [3i64, 1, 2] {
            b.insert_source_row(id, AttributeMap::new());
        }

        let first = b.fetch_source_batch(None, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, PkValue::Int(1));
        assert_eq!(first[1].id, PkValue::Int(2));

        let rest = b.fetch_source_batch(Some(&first[1].id), 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, PkValue::Int(3));
    }

    #[tokio::test]
    async fn test_remove_column_drops_row_values() {
        let b = backend();
        b.create_table(
            "posts",
            &[
                ColumnDef::new("id", ColumnType::BigInt),
                ColumnDef::new("title", ColumnType::String),
            ],
        )
        .await
        .unwrap();
        let mut values = AttributeMap::new();
        values.insert("title".to_string(), Value::from("hello"));
        b.insert_source_row(1i64, values);

        b.remove_column("posts", "title").await.unwrap();
        assert!(b.source_rows()[&PkValue::Int(1)].get("title").is_none());
    }
}
