//! Schema and value types for translation-table migrations.
//!
//! These types provide a database-agnostic representation of column metadata,
//! column definitions handed to the DDL layer, and the values carried by
//! data-movement passes.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical column type, mapped to a concrete SQL type by the schema layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Text,
    Integer,
    BigInt,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Binary,
}

/// Represents a primary key value of various types.
///
/// This enum allows handling different PK types uniformly during batched
/// cursor iteration and row matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PkValue {
    /// Integer primary key (covers int and bigint).
    Int(i64),
    /// UUID primary key.
    Uuid(Uuid),
    /// String primary key.
    String(String),
}

impl From<i64> for PkValue {
    fn from(v: i64) -> Self {
        PkValue::Int(v)
    }
}

impl From<i32> for PkValue {
    fn from(v: i32) -> Self {
        PkValue::Int(v as i64)
    }
}

impl From<Uuid> for PkValue {
    fn from(v: Uuid) -> Self {
        PkValue::Uuid(v)
    }
}

impl From<String> for PkValue {
    fn from(v: String) -> Self {
        PkValue::String(v)
    }
}

impl From<&str> for PkValue {
    fn from(v: &str) -> Self {
        PkValue::String(v.to_string())
    }
}

/// Owned SQL value carried by data-movement passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// DDL modifiers a structured field spec may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnModifiers {
    /// Whether the column allows NULL (unset means backend default).
    pub nullable: Option<bool>,

    /// Default value.
    pub default: Option<Value>,

    /// Maximum length for string/binary types.
    pub limit: Option<u32>,

    /// Numeric precision.
    pub precision: Option<u32>,

    /// Numeric scale.
    pub scale: Option<u32>,
}

/// Column-type descriptor for one translatable field.
///
/// Either a bare type or a type plus DDL modifiers. The variant is resolved
/// once during field resolution; [`FieldSpec::to_column_def`] is the single
/// place where a structured spec is expanded into column-creation arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldSpec {
    /// Bare type, no modifiers.
    Bare(ColumnType),

    /// Type plus DDL modifiers (nullability, default, limit, precision, scale).
    Typed {
        column_type: ColumnType,
        modifiers: ColumnModifiers,
    },
}

impl FieldSpec {
    /// The logical column type of this spec.
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldSpec::Bare(ty) => *ty,
            FieldSpec::Typed { column_type, .. } => *column_type,
        }
    }

    /// Expand this spec into a column definition for the DDL layer.
    pub fn to_column_def(&self, name: &str) -> ColumnDef {
        match self {
            FieldSpec::Bare(ty) => ColumnDef::new(name, *ty),
            FieldSpec::Typed {
                column_type,
                modifiers,
            } => ColumnDef {
                name: name.to_string(),
                column_type: *column_type,
                modifiers: modifiers.clone(),
            },
        }
    }
}

impl From<ColumnType> for FieldSpec {
    fn from(ty: ColumnType) -> Self {
        FieldSpec::Bare(ty)
    }
}

/// Mapping from attribute name to field spec, as passed to migration calls.
pub type FieldMap = BTreeMap<String, FieldSpec>;

/// A column definition handed to the DDL layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,

    /// Logical column type.
    pub column_type: ColumnType,

    /// DDL modifiers.
    pub modifiers: ColumnModifiers,
}

impl ColumnDef {
    /// Create a column definition with default modifiers.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            modifiers: ColumnModifiers::default(),
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.modifiers.nullable = Some(false);
        self
    }

    /// Set the length limit.
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.modifiers.limit = limit;
        self
    }
}

/// Introspected column metadata, as reported by the schema layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Logical column type.
    pub column_type: ColumnType,

    /// Maximum length for string/binary types.
    pub limit: Option<u32>,

    /// Numeric precision.
    pub precision: Option<u32>,

    /// Numeric scale.
    pub scale: Option<u32>,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Default value.
    pub default: Option<Value>,
}

impl Column {
    /// Convert introspected metadata back into a column definition.
    ///
    /// Used when re-creating source columns from the translation table's
    /// current metadata during a drop.
    pub fn to_def(&self) -> ColumnDef {
        ColumnDef {
            name: self.name.clone(),
            column_type: self.column_type,
            modifiers: ColumnModifiers {
                nullable: Some(self.is_nullable),
                default: self.default.clone(),
                limit: self.limit,
                precision: self.precision,
                scale: self.scale,
            },
        }
    }
}

/// An index definition handed to the DDL layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,

    /// Indexed column names.
    pub columns: Vec<String>,

    /// Whether the index is unique.
    pub is_unique: bool,
}

/// Read-only descriptor of the table being translated.
///
/// Owned by the caller and built from the model layer; the migrator only
/// queries it. Current column metadata is read through the schema layer, not
/// from this descriptor, so it stays valid across DDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    /// Table name (including any prefix).
    pub name: String,

    /// Table-name prefix stripped when deriving the foreign-key column.
    pub name_prefix: String,

    /// Primary-key column name.
    pub primary_key: String,

    /// Declared type of the primary key.
    pub pk_type: ColumnType,

    /// Declared length limit of the primary key, if any.
    pub pk_limit: Option<u32>,

    /// Attribute names the model declares as translatable.
    pub translated_attributes: Vec<String>,
}

impl SourceTable {
    /// Create a descriptor with an `id` bigint primary key and no prefix.
    pub fn new(name: impl Into<String>, translated_attributes: &[&str]) -> Self {
        Self {
            name: name.into(),
            name_prefix: String::new(),
            primary_key: "id".to_string(),
            pk_type: ColumnType::BigInt,
            pk_limit: None,
            translated_attributes: translated_attributes
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Set the table-name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set the primary-key column name, type, and limit.
    pub fn with_primary_key(
        mut self,
        name: impl Into<String>,
        pk_type: ColumnType,
        pk_limit: Option<u32>,
    ) -> Self {
        self.primary_key = name.into();
        self.pk_type = pk_type;
        self.pk_limit = pk_limit;
        self
    }
}
