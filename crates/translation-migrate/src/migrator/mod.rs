//! The migration engine: one instance per source table per migration run.
//!
//! [`Migrator`] derives the translation-table shape from a source-table
//! descriptor, executes the DDL through a [`SchemaOps`] collaborator, and
//! moves data through a [`ModelOps`] collaborator. Four operations are
//! exposed to migration scripts:
//!
//! - [`create_translation_table`](Migrator::create_translation_table)
//! - [`add_translation_fields`](Migrator::add_translation_fields)
//! - [`remove_source_columns`](Migrator::remove_source_columns)
//! - [`drop_translation_table`](Migrator::drop_translation_table)
//!
//! # Option validation asymmetry
//!
//! Create and add enforce a strict allow-list on their options and fail with
//! [`UnknownOption`](crate::MigrateError::UnknownOption) before touching the
//! schema. Drop does not: unrecognized keys are silently ignored. This
//! asymmetry is long-standing observable behavior and is preserved rather
//! than unified; scripts written against it must keep working.
//!
//! # Failure model
//!
//! Operations are sequential and run-to-completion. A failure mid-operation
//! leaves the schema in whatever state the prior successful steps produced;
//! nothing is rolled back here. Callers may wrap an operation in an external
//! transaction where the database supports transactional DDL.

mod data;
mod fields;
mod options;

pub use options::{
    MigrationOptions, CREATE_SOURCE_COLUMNS, MIGRATE_DATA, REMOVE_SOURCE_COLUMNS, UNIQUE_INDEX,
};

use std::sync::OnceLock;

use tracing::{debug, info};

use crate::config::MigratorConfig;
use crate::core::naming;
use crate::core::schema::{Column, ColumnDef, ColumnType, FieldMap, IndexDef, SourceTable};
use crate::core::traits::{ModelOps, SchemaOps};
use crate::error::Result;

const CREATE_OP: &str = "create_translation_table";
const ADD_OP: &str = "add_translation_fields";

/// Migration engine bound to one source table.
///
/// Resolved fields and derived names are memoized for the instance's
/// lifetime; an instance is meant to live for a single migration script run.
pub struct Migrator<S, M> {
    source: SourceTable,
    schema: S,
    model: M,
    config: MigratorConfig,
    fields: Option<FieldMap>,
    translation_table: OnceLock<String>,
    foreign_key: OnceLock<String>,
}

impl<S: SchemaOps, M: ModelOps> Migrator<S, M> {
    /// Create a migrator with the default configuration.
    pub fn new(source: SourceTable, schema: S, model: M) -> Self {
        Self::with_config(source, schema, model, MigratorConfig::default())
    }

    /// Create a migrator with an explicit configuration.
    pub fn with_config(source: SourceTable, schema: S, model: M, config: MigratorConfig) -> Self {
        Self {
            source,
            schema,
            model,
            config,
            fields: None,
            translation_table: OnceLock::new(),
            foreign_key: OnceLock::new(),
        }
    }

    /// The source-table descriptor this migrator is bound to.
    pub fn source(&self) -> &SourceTable {
        &self.source
    }

    /// Derived translation table name.
    pub fn translation_table_name(&self) -> &str {
        self.translation_table
            .get_or_init(|| naming::translation_table_name(&self.source.name))
    }

    /// Derived foreign-key column name on the translation table.
    pub fn foreign_key_column(&self) -> &str {
        self.foreign_key
            .get_or_init(|| naming::foreign_key_column(&self.source.name, &self.source.name_prefix))
    }

    /// Create the translation table, its field columns, and its indexes.
    ///
    /// Recognized options: `migrate_data`, `remove_source_columns`,
    /// `unique_index`. Any other key fails with `UnknownOption` before any
    /// DDL executes. An empty `fields` mapping triggers auto-resolution over
    /// every declared translatable attribute.
    pub async fn create_translation_table(
        &mut self,
        fields: FieldMap,
        options: &MigrationOptions,
    ) -> Result<()> {
        options.ensure_known(CREATE_OP, &[MIGRATE_DATA, REMOVE_SOURCE_COLUMNS, UNIQUE_INDEX])?;
        let fields = self.resolve_fields(fields).await?;

        let ttable = self.translation_table_name().to_string();
        let mut columns = vec![
            ColumnDef::new(self.foreign_key_column(), self.source.pk_type)
                .not_null()
                .with_limit(self.source.pk_limit),
            ColumnDef::new("locale", ColumnType::String).not_null(),
        ];
        if self.config.timestamps {
            columns.push(ColumnDef::new("created_at", ColumnType::DateTime).not_null());
            columns.push(ColumnDef::new("updated_at", ColumnType::DateTime).not_null());
        }

        debug!(table = %ttable, "creating translation table");
        self.schema.create_table(&ttable, &columns).await?;
        self.apply_fields(&fields, options).await?;
        self.create_translation_indexes(options.is_set(UNIQUE_INDEX))
            .await?;
        self.post_ddl_barrier().await;

        info!(table = %ttable, fields = fields.len(), "created translation table");
        Ok(())
    }

    /// Add field columns to an existing translation table.
    ///
    /// Recognized options: `migrate_data`, `remove_source_columns`. Any other
    /// key fails with `UnknownOption` before any DDL executes.
    pub async fn add_translation_fields(
        &mut self,
        fields: FieldMap,
        options: &MigrationOptions,
    ) -> Result<()> {
        options.ensure_known(ADD_OP, &[MIGRATE_DATA, REMOVE_SOURCE_COLUMNS])?;
        let fields = self.resolve_fields(fields).await?;
        self.apply_fields(&fields, options).await
    }

    /// Drop each resolved field's column from the source table.
    ///
    /// Idempotent: columns already gone are skipped silently, so a partially
    /// completed prior run can be retried.
    pub async fn remove_source_columns(&mut self) -> Result<()> {
        let fields = self.resolve_fields(FieldMap::new()).await?;
        self.remove_columns_for(&fields).await?;
        self.post_ddl_barrier().await;
        Ok(())
    }

    /// Drop the translation table, its indexes, and optionally move data back.
    ///
    /// Recognized options: `create_source_columns`, `migrate_data`. Unlike
    /// create/add, unrecognized keys are silently ignored (see module docs).
    pub async fn drop_translation_table(&mut self, options: &MigrationOptions) -> Result<()> {
        if options.is_set(CREATE_SOURCE_COLUMNS) {
            self.create_source_columns().await?;
        }
        if options.is_set(MIGRATE_DATA) {
            let locale = self.config.locale.clone();
            let fields = self.resolve_fields(FieldMap::new()).await?;
            let names: Vec<String> = fields.keys().cloned().collect();
            self.move_data_to_source(&locale, &names).await?;
        }

        self.drop_translation_indexes().await?;
        let ttable = self.translation_table_name().to_string();
        debug!(table = %ttable, "dropping translation table");
        self.schema.drop_table(&ttable).await?;
        self.post_ddl_barrier().await;

        info!(table = %ttable, "dropped translation table");
        Ok(())
    }

    /// Add field columns, then run the optional data/removal steps.
    ///
    /// Shared tail of create and add. Option validation happened in the
    /// public entry points, so the full create option set is accepted here.
    async fn apply_fields(&mut self, fields: &FieldMap, options: &MigrationOptions) -> Result<()> {
        let ttable = self.translation_table_name().to_string();
        for (name, spec) in fields {
            let def = spec.to_column_def(name);
            debug!(table = %ttable, column = %name, "adding translation field column");
            self.schema.add_column(&ttable, &def).await?;
        }
        // Movement reads current column metadata, so refresh before it runs.
        self.post_ddl_barrier().await;

        if options.is_set(MIGRATE_DATA) {
            let locale = self.config.locale.clone();
            let names: Vec<String> = fields.keys().cloned().collect();
            self.move_data_to_translation(&locale, &names).await?;
        }
        if options.is_set(REMOVE_SOURCE_COLUMNS) {
            self.remove_columns_for(fields).await?;
        }
        self.post_ddl_barrier().await;
        Ok(())
    }

    async fn remove_columns_for(&self, fields: &FieldMap) -> Result<()> {
        for name in fields.keys() {
            if self.schema.column_exists(&self.source.name, name).await? {
                debug!(table = %self.source.name, column = %name, "removing source column");
                self.schema.remove_column(&self.source.name, name).await?;
            } else {
                debug!(table = %self.source.name, column = %name, "source column absent, skipping");
            }
        }
        Ok(())
    }

    /// Re-add translatable-attribute columns missing from the source table,
    /// typed from the translation table's current column metadata.
    async fn create_source_columns(&mut self) -> Result<()> {
        // Earlier DDL may have left the metadata stale; refresh before reading.
        self.post_ddl_barrier().await;
        let ttable = self.translation_table_name().to_string();
        let translation_columns = self.schema.columns(&ttable).await?;

        for name in self.source.translated_attributes.clone() {
            if self.schema.column_exists(&self.source.name, &name).await? {
                continue;
            }
            let def = translation_columns
                .iter()
                .find(|c| c.name == name)
                .map(Column::to_def)
                .unwrap_or_else(|| ColumnDef::new(name.as_str(), ColumnType::String));
            debug!(table = %self.source.name, column = %name, "re-creating source column");
            self.schema.add_column(&self.source.name, &def).await?;
        }
        self.post_ddl_barrier().await;
        Ok(())
    }

    /// The three index definitions, names truncated to the backend's limit.
    fn index_defs(&self, unique: bool) -> Vec<IndexDef> {
        let ttable = self.translation_table_name();
        let fk = self.foreign_key_column();
        let limit = self.schema.max_identifier_len();

        let mut defs = vec![
            IndexDef {
                name: naming::truncate_index_name(&naming::fk_index_name(ttable, fk), limit),
                columns: vec![fk.to_string()],
                is_unique: false,
            },
            IndexDef {
                name: naming::truncate_index_name(&naming::locale_index_name(ttable), limit),
                columns: vec!["locale".to_string()],
                is_unique: false,
            },
        ];
        if unique {
            defs.push(IndexDef {
                name: naming::truncate_index_name(&naming::unique_index_name(ttable, fk), limit),
                columns: vec![fk.to_string(), "locale".to_string()],
                is_unique: true,
            });
        }
        defs
    }

    async fn create_translation_indexes(&self, unique: bool) -> Result<()> {
        let ttable = self.translation_table_name().to_string();
        for index in self.index_defs(unique) {
            debug!(table = %ttable, index = %index.name, unique = index.is_unique, "creating index");
            self.schema.add_index(&ttable, &index).await?;
        }
        Ok(())
    }

    /// Drop whichever of the three indexes exist.
    ///
    /// Each is independently optional: a table created without `unique_index`
    /// never had the composite one.
    async fn drop_translation_indexes(&self) -> Result<()> {
        let ttable = self.translation_table_name().to_string();
        let present = self.schema.index_names(&ttable).await?;
        for index in self.index_defs(true) {
            if present.contains(&index.name) {
                debug!(table = %ttable, index = %index.name, "dropping index");
                self.schema.remove_index(&ttable, &index.name).await?;
            }
        }
        Ok(())
    }

    /// Invalidate cached metadata for both logical tables after DDL.
    ///
    /// Centralized so no call site can refresh one table and forget the
    /// other; stale metadata on either side corrupts later column reads.
    async fn post_ddl_barrier(&self) {
        self.schema.clear_schema_cache(&self.source.name).await;
        let ttable = self.translation_table_name().to_string();
        self.schema.clear_schema_cache(&ttable).await;
    }
}
