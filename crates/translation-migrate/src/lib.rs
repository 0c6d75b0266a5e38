//! # translation-migrate
//!
//! Schema migration engine for the translation-table pattern: given a source
//! table and a set of attributes marked translatable, it creates, populates,
//! and removes a companion table holding one row per (record, locale) pair.
//!
//! The engine derives column definitions from the source table's schema,
//! synthesizes the auxiliary table and its indexes, and moves data
//! bidirectionally between the two tables, invalidating cached schema
//! metadata after every DDL step. The ORM/connection layer is consumed
//! through two narrow traits ([`SchemaOps`], [`ModelOps`]) and never
//! reimplemented here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use translation_migrate::{
//!     FieldMap, MemoryBackend, MigrationOptions, Migrator, SourceTable, MIGRATE_DATA,
//!     UNIQUE_INDEX,
//! };
//!
//! #[tokio::main]
//! async fn main() -> translation_migrate::Result<()> {
//!     let backend = MemoryBackend::new("posts", "post_translations");
//!     let source = SourceTable::new("posts", &["title", "body"]);
//!     let mut migrator = Migrator::new(source, backend.clone(), backend);
//!
//!     let options = MigrationOptions::new()
//!         .with(MIGRATE_DATA, true)
//!         .with(UNIQUE_INDEX, true);
//!     migrator.create_translation_table(FieldMap::new(), &options).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod migrator;

// Re-exports for convenient access
pub use backend::MemoryBackend;
pub use config::MigratorConfig;
pub use crate::core::{
    AttributeMap, Column, ColumnDef, ColumnModifiers, ColumnType, FieldMap, FieldSpec, IndexDef,
    ModelOps, PkValue, SchemaOps, SourceRecord, SourceTable, Value,
};
pub use error::{MigrateError, Result};
pub use migrator::{
    MigrationOptions, Migrator, CREATE_SOURCE_COLUMNS, MIGRATE_DATA, REMOVE_SOURCE_COLUMNS,
    UNIQUE_INDEX,
};
