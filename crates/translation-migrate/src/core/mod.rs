//! Database-agnostic core: schema types, derived naming, and collaborator traits.

pub mod naming;
pub mod schema;
pub mod traits;

pub use schema::{
    Column, ColumnDef, ColumnModifiers, ColumnType, FieldMap, FieldSpec, IndexDef, PkValue,
    SourceTable, Value,
};
pub use traits::{AttributeMap, ModelOps, SchemaOps, SourceRecord};
