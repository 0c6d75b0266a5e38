//! Field resolution and validation.

use tracing::debug;

use crate::core::schema::{ColumnType, FieldMap, FieldSpec};
use crate::core::traits::{ModelOps, SchemaOps};
use crate::error::{MigrateError, Result};

use super::Migrator;

impl<S: SchemaOps, M: ModelOps> Migrator<S, M> {
    /// Resolve the field mapping for an operation and memoize it.
    ///
    /// A non-empty explicit mapping is used verbatim: the caller takes full
    /// responsibility for the types. An empty mapping resolves every declared
    /// translatable attribute, typed from the source table's existing column
    /// of the same name, defaulting to string when no such column exists.
    /// Every resolved key must be a declared translatable attribute.
    pub(crate) async fn resolve_fields(&mut self, explicit: FieldMap) -> Result<FieldMap> {
        let resolved = if !explicit.is_empty() {
            explicit
        } else if let Some(memo) = &self.fields {
            memo.clone()
        } else {
            self.complete_translated_fields().await?
        };
        self.validate_fields(&resolved)?;
        self.fields = Some(resolved.clone());
        Ok(resolved)
    }

    /// Build a field spec for every declared translatable attribute.
    async fn complete_translated_fields(&self) -> Result<FieldMap> {
        let columns = self.schema.columns(&self.source.name).await?;
        let mut fields = FieldMap::new();
        for name in &self.source.translated_attributes {
            let column_type = columns
                .iter()
                .find(|c| c.name == *name)
                .map(|c| c.column_type)
                .unwrap_or(ColumnType::String);
            debug!(attribute = %name, ?column_type, "resolved translatable field");
            fields.insert(name.clone(), FieldSpec::Bare(column_type));
        }
        Ok(fields)
    }

    fn validate_fields(&self, fields: &FieldMap) -> Result<()> {
        for name in fields.keys() {
            if !self.source.translated_attributes.iter().any(|a| a == name) {
                return Err(MigrateError::BadFieldName(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::core::schema::{Column, SourceTable};

    fn seeded_backend() -> MemoryBackend {
        let backend = MemoryBackend::new("posts", "post_translations");
        backend.seed_source_table(vec![
            Column {
                name: "id".to_string(),
                column_type: ColumnType::BigInt,
                limit: None,
                precision: None,
                scale: None,
                is_nullable: false,
                default: None,
            },
            Column {
                name: "body".to_string(),
                column_type: ColumnType::Text,
                limit: None,
                precision: None,
                scale: None,
                is_nullable: true,
                default: None,
            },
        ]);
        backend
    }

    fn migrator(backend: &MemoryBackend) -> Migrator<MemoryBackend, MemoryBackend> {
        Migrator::new(
            SourceTable::new("posts", &["title", "body"]),
            backend.clone(),
            backend.clone(),
        )
    }

    #[tokio::test]
    async fn test_empty_fields_resolve_from_source_columns() {
        let backend = seeded_backend();
        let mut m = migrator(&backend);

        let fields = m.resolve_fields(FieldMap::new()).await.unwrap();
        assert_eq!(fields.len(), 2);
        // `body` exists on the source table and keeps its type
        assert_eq!(fields["body"], FieldSpec::Bare(ColumnType::Text));
        // `title` has no source column and defaults to string
        assert_eq!(fields["title"], FieldSpec::Bare(ColumnType::String));
    }

    #[tokio::test]
    async fn test_explicit_fields_used_verbatim() {
        let backend = seeded_backend();
        let mut m = migrator(&backend);

        let mut explicit = FieldMap::new();
        explicit.insert("title".to_string(), FieldSpec::Bare(ColumnType::Text));
        let fields = m.resolve_fields(explicit).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], FieldSpec::Bare(ColumnType::Text));
    }

    #[tokio::test]
    async fn test_unknown_field_name_is_rejected() {
        let backend = seeded_backend();
        let mut m = migrator(&backend);

        let mut explicit = FieldMap::new();
        explicit.insert("author".to_string(), FieldSpec::Bare(ColumnType::String));
        let err = m.resolve_fields(explicit).await.unwrap_err();
        assert!(matches!(err, MigrateError::BadFieldName(name) if name == "author"));
    }

    #[tokio::test]
    async fn test_resolution_is_memoized_for_the_instance() {
        let backend = seeded_backend();
        let mut m = migrator(&backend);

        let mut explicit = FieldMap::new();
        explicit.insert("title".to_string(), FieldSpec::Bare(ColumnType::Text));
        m.resolve_fields(explicit).await.unwrap();

        // A later call with no explicit fields reuses the memoized mapping
        let fields = m.resolve_fields(FieldMap::new()).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("title"));
    }
}
