//! Migration options and their allow-list validation.
//!
//! Options are carried as an open key set rather than a closed struct so the
//! create/add paths can reject unrecognized keys the way the drop path cannot:
//! `drop_translation_table` deliberately ignores anything it does not
//! recognize. That asymmetry is long-standing observable behavior and is kept
//! as-is (see the crate docs).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Run a data-movement pass as part of the operation.
pub const MIGRATE_DATA: &str = "migrate_data";

/// Drop migrated columns from the source table after the forward pass.
pub const REMOVE_SOURCE_COLUMNS: &str = "remove_source_columns";

/// Create a unique composite (foreign key, locale) index.
pub const UNIQUE_INDEX: &str = "unique_index";

/// Re-create missing source columns before dropping the translation table.
pub const CREATE_SOURCE_COLUMNS: &str = "create_source_columns";

/// An options record passed to a migration operation.
///
/// Keys map to boolean flags; a key that is absent counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions(BTreeMap<String, bool>);

impl MigrationOptions {
    /// Create an empty options record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, builder-style.
    pub fn with(mut self, key: impl Into<String>, value: bool) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Whether a flag is present and set.
    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// Keys present in the record.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Reject any key outside the allow-list for the given operation.
    pub(crate) fn ensure_known(&self, operation: &'static str, allowed: &[&str]) -> Result<()> {
        for key in self.keys() {
            if !allowed.contains(&key) {
                return Err(MigrateError::unknown_option(operation, key, allowed));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_unset() {
        let options = MigrationOptions::new();
        assert!(!options.is_set(MIGRATE_DATA));
    }

    #[test]
    fn test_explicit_false_is_unset() {
        let options = MigrationOptions::new().with(MIGRATE_DATA, false);
        assert!(!options.is_set(MIGRATE_DATA));
    }

    #[test]
    fn test_ensure_known_accepts_allowed_keys() {
        let options = MigrationOptions::new()
            .with(MIGRATE_DATA, true)
            .with(UNIQUE_INDEX, true);
        assert!(options
            .ensure_known("create_translation_table", &[MIGRATE_DATA, UNIQUE_INDEX])
            .is_ok());
    }

    #[test]
    fn test_ensure_known_rejects_unknown_key() {
        let options = MigrationOptions::new().with("uniq_index", true);
        let err = options
            .ensure_known("create_translation_table", &[MIGRATE_DATA, UNIQUE_INDEX])
            .unwrap_err();
        assert!(matches!(err, MigrateError::UnknownOption { .. }));
    }

    #[test]
    fn test_ensure_known_rejects_unknown_key_even_when_false() {
        // An unrecognized key is an error regardless of its value
        let options = MigrationOptions::new().with("verbose", false);
        assert!(options
            .ensure_known("add_translation_fields", &[MIGRATE_DATA])
            .is_err());
    }
}
