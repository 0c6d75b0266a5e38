//! Bulk data-movement passes between the source and translation tables.
//!
//! Both passes iterate in primary-key-ordered batches so the whole table is
//! never held in memory, and both target one explicit locale. A persistence
//! failure on any row aborts the pass; rows already moved stay moved.

use tracing::{debug, info, warn};

use crate::core::schema::{PkValue, Value};
use crate::core::traits::{AttributeMap, ModelOps, SchemaOps};
use crate::error::Result;

use super::Migrator;

impl<S: SchemaOps, M: ModelOps> Migrator<S, M> {
    /// Copy each resolved field's raw value from every source row into that
    /// row's translation row for `locale`.
    pub(crate) async fn move_data_to_translation(
        &self,
        locale: &str,
        field_names: &[String],
    ) -> Result<()> {
        debug!(
            table = %self.source.name,
            locale,
            batch_size = self.config.batch_size,
            "moving source data into translation table"
        );

        let mut cursor: Option<PkValue> = None;
        let mut moved = 0u64;
        loop {
            let batch = self
                .model
                .fetch_source_batch(cursor.as_ref(), self.config.batch_size)
                .await?;
            let Some(last) = batch.last() else {
                break;
            };
            let next = last.id.clone();

            for record in &batch {
                let mut values = AttributeMap::new();
                for name in field_names {
                    let value = record.values.get(name).cloned().unwrap_or(Value::Null);
                    values.insert(name.clone(), value);
                }
                self.model
                    .upsert_translation(&record.id, locale, &values)
                    .await?;
                moved += 1;
            }
            cursor = Some(next);
        }

        info!(
            table = %self.translation_table_name(),
            locale,
            rows = moved,
            "moved source data into translation table"
        );
        Ok(())
    }

    /// Write each record's combined attribute values back onto the source row.
    ///
    /// Lossy across locales by design: the combined view exposes one set of
    /// values per record (the given locale's, falling back to the source
    /// column), so values held only by other locales' translation rows do not
    /// survive the reverse move. This mirrors the forward pass's single-locale
    /// shape and is intentionally not patched over with a merge policy.
    pub(crate) async fn move_data_to_source(
        &self,
        locale: &str,
        field_names: &[String],
    ) -> Result<()> {
        warn!(
            table = %self.source.name,
            locale,
            "reverse data movement keeps only one locale's values per record"
        );

        let mut cursor: Option<PkValue> = None;
        let mut updated = 0u64;
        loop {
            let batch = self
                .model
                .fetch_combined_batch(locale, cursor.as_ref(), self.config.batch_size)
                .await?;
            let Some(last) = batch.last() else {
                break;
            };
            let next = last.id.clone();

            for record in &batch {
                let values: AttributeMap = field_names
                    .iter()
                    .filter_map(|name| {
                        record
                            .values
                            .get(name)
                            .map(|value| (name.clone(), value.clone()))
                    })
                    .collect();
                updated += self.model.update_source_row(&record.id, &values).await?;
            }
            cursor = Some(next);
        }

        info!(
            table = %self.source.name,
            locale,
            rows = updated,
            "moved translation data back into source table"
        );
        Ok(())
    }
}
