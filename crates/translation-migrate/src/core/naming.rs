//! Derived identifier naming for translation tables and their indexes.
//!
//! All identifiers are computed deterministically from the source table name:
//! the same input always yields the same table, foreign-key, and index names.
//! Names that would not fit the target database's identifier-length limit are
//! replaced by a fixed-width SHA-1-derived fallback.

use sha1::{Digest, Sha1};

/// Singularize an English table name.
///
/// Deterministic suffix rules, not a full inflector: `ies` becomes `y`,
/// sibilant `es` endings are stripped, and a plain trailing `s` is dropped.
/// Names this cannot singularize (irregular plurals) pass through unchanged.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["ses", "xes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Derive the translation table name from the source table name.
pub fn translation_table_name(table_name: &str) -> String {
    format!("{}_translations", singularize(table_name))
}

/// Derive the foreign-key column name on the translation table.
///
/// The table-name prefix is stripped before singularizing, so a prefixed
/// `app_posts` still yields `post_id`.
pub fn foreign_key_column(table_name: &str, prefix: &str) -> String {
    let stripped = table_name.strip_prefix(prefix).unwrap_or(table_name);
    format!("{}_id", singularize(stripped))
}

/// Name of the index on the foreign-key column (before truncation).
pub fn fk_index_name(translation_table: &str, foreign_key: &str) -> String {
    format!("index_{translation_table}_on_{foreign_key}")
}

/// Name of the index on the locale column (before truncation).
pub fn locale_index_name(translation_table: &str) -> String {
    format!("index_{translation_table}_on_locale")
}

/// Name of the unique composite (foreign key, locale) index (before truncation).
pub fn unique_index_name(translation_table: &str, foreign_key: &str) -> String {
    format!("index_{translation_table}_on_{foreign_key}_and_locale")
}

/// Replace an index name that does not fit the identifier-length limit.
///
/// Names shorter than the limit pass through unchanged. Anything else becomes
/// `index_` followed by the first `limit - 6` hex characters of the SHA-1 of
/// the full name, which is stable across calls and fixed-width.
pub fn truncate_index_name(name: &str, limit: usize) -> String {
    if name.len() < limit {
        return name.to_string();
    }
    let digest = format!("{:x}", Sha1::digest(name.as_bytes()));
    let take = limit.saturating_sub("index_".len()).min(digest.len());
    format!("index_{}", &digest[..take])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize_rules() {
        assert_eq!(singularize("posts"), "post");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("dishes"), "dish");
        assert_eq!(singularize("sizes"), "size");
        // No trailing plural marker: unchanged
        assert_eq!(singularize("data"), "data");
        // Double-s endings are not plurals
        assert_eq!(singularize("address"), "address");
    }

    #[test]
    fn test_translation_table_name() {
        assert_eq!(translation_table_name("posts"), "post_translations");
        assert_eq!(
            translation_table_name("categories"),
            "category_translations"
        );
    }

    #[test]
    fn test_foreign_key_column_strips_prefix() {
        assert_eq!(foreign_key_column("posts", ""), "post_id");
        assert_eq!(foreign_key_column("app_posts", "app_"), "post_id");
        // Prefix not present: name used as-is
        assert_eq!(foreign_key_column("posts", "app_"), "post_id");
    }

    #[test]
    fn test_index_names() {
        assert_eq!(
            fk_index_name("post_translations", "post_id"),
            "index_post_translations_on_post_id"
        );
        assert_eq!(
            locale_index_name("post_translations"),
            "index_post_translations_on_locale"
        );
        assert_eq!(
            unique_index_name("post_translations", "post_id"),
            "index_post_translations_on_post_id_and_locale"
        );
    }

    #[test]
    fn test_truncate_short_name_unchanged() {
        assert_eq!(
            truncate_index_name("index_post_translations_on_locale", 63),
            "index_post_translations_on_locale"
        );
    }

    #[test]
    fn test_truncate_long_name_is_fixed_width_and_stable() {
        let long = unique_index_name(
            "extraordinarily_long_model_name_translations",
            "extraordinarily_long_model_name_id",
        );
        assert!(long.len() >= 63);

        let a = truncate_index_name(&long, 40);
        let b = truncate_index_name(&long, 40);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.starts_with("index_"));
        assert!(a[6..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_truncate_fallback_caps_at_digest_width() {
        // A 63-char limit leaves room for 57 hex chars, but SHA-1 yields 40
        let long = format!("index_{}_on_locale", "a".repeat(80));
        let truncated = truncate_index_name(&long, 63);
        assert_eq!(truncated.len(), "index_".len() + 40);
    }

    #[test]
    fn test_truncate_different_names_diverge() {
        let long_a = format!("index_{}_on_locale", "a".repeat(80));
        let long_b = format!("index_{}_on_locale", "b".repeat(80));
        assert_ne!(
            truncate_index_name(&long_a, 63),
            truncate_index_name(&long_b, 63)
        );
    }

    #[test]
    fn test_truncate_name_at_exact_limit_is_replaced() {
        let name = "x".repeat(40);
        let truncated = truncate_index_name(&name, 40);
        assert_ne!(truncated, name);
        assert_eq!(truncated.len(), 40);
    }
}
