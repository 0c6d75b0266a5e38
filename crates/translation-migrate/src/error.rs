//! Error types for the migration engine.

use thiserror::Error;

/// Main error type for translation-table migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// An options record contained a key outside the operation's allow-list.
    ///
    /// Raised before any DDL executes, so an invalid call never partially
    /// mutates the schema.
    #[error("unknown {operation} option `{option}` (recognized: {allowed})")]
    UnknownOption {
        operation: &'static str,
        option: String,
        allowed: String,
    },

    /// A field key is not among the model's declared translatable attributes.
    ///
    /// Guards against typos and against accidentally migrating columns that
    /// were never marked translatable. Raised before any DDL executes.
    #[error("field `{0}` is not a declared translatable attribute")]
    BadFieldName(String),

    /// A DDL or introspection operation failed in the schema layer.
    #[error("schema operation failed on table {table}: {message}")]
    Schema { table: String, message: String },

    /// A data-movement pass failed to persist a row.
    ///
    /// Any single failed row aborts the whole pass; partial progress is left
    /// in place for the operator to inspect.
    #[error("data movement failed for table {table}: {message}")]
    DataMove { table: String, message: String },

    /// Configuration error (invalid YAML, empty locale, zero batch size).
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (config file loading).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create a Schema error for a table.
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a DataMove error for a table.
    pub fn data_move(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::DataMove {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an UnknownOption error listing the recognized keys.
    pub fn unknown_option(operation: &'static str, option: impl Into<String>, allowed: &[&str]) -> Self {
        MigrateError::UnknownOption {
            operation,
            option: option.into(),
            allowed: allowed.join(", "),
        }
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_option_message_lists_allowed_keys() {
        let err = MigrateError::unknown_option(
            "create_translation_table",
            "uniq_index",
            &["migrate_data", "remove_source_columns", "unique_index"],
        );
        let msg = err.to_string();
        assert!(msg.contains("uniq_index"));
        assert!(msg.contains("unique_index"));
        assert!(msg.contains("create_translation_table"));
    }

    #[test]
    fn test_bad_field_name_message() {
        let err = MigrateError::BadFieldName("titel".to_string());
        assert!(err.to_string().contains("titel"));
        assert!(err.to_string().contains("translatable"));
    }
}
