//! Content records and frontmatter normalization.
//!
//! Source backends hold metadata in different native shapes: the file
//! backend has fenced TOML text, the database backend has real columns.
//! [`normalize`] folds both into one uniform [`ContentRecord`], the only
//! shape the resolver and generators ever see.

use crate::utils::date::DateTimeUtc;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw Records
// ============================================================================

/// A content record as a source backend returns it, before normalization.
#[derive(Debug, Clone)]
pub struct RawContent {
    /// Fallback slug derived by the backend (file stem or row key).
    /// A `slug` frontmatter field overrides it.
    pub slug: String,

    /// Frontmatter in whichever shape the backend natively holds it.
    pub frontmatter: FrontmatterBlob,

    /// Body text, carried through untouched.
    pub body: String,
}

/// Frontmatter as surfaced by a backend: already parsed, or serialized text
/// still requiring deserialization.
#[derive(Debug, Clone)]
pub enum FrontmatterBlob {
    Parsed(toml::Table),
    Text(String),
}

/// Known frontmatter fields.
///
/// Unknown fields (descriptions, image links, ...) are legitimate and
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// ISO 8601 date, e.g. `"2024-01-15"`. Absent for undated entries.
    pub timestamp: Option<String>,
    /// Comma-delimited tag list, e.g. `"remix, forms"`.
    pub tags: Option<String>,
    #[serde(default)]
    pub published: bool,
}

// ============================================================================
// Normalized Records
// ============================================================================

/// A normalized content record.
///
/// Constructed once per resolution from the source's current snapshot and
/// immutable thereafter. Slug uniqueness is the source's responsibility and
/// is not re-validated here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    /// Stable external identity, used as the URL segment.
    pub slug: String,

    pub title: String,

    /// ISO 8601 date string; `None` for undated entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Tags in frontmatter order (not sorted).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub published: bool,

    /// Body text; never consulted by listing, facet, or sitemap logic.
    #[serde(skip)]
    pub body: String,
}

/// Normalize one raw record into a [`ContentRecord`].
///
/// Fails on unparsable frontmatter or an invalid `timestamp`. The caller is
/// expected to abort the whole resolution on failure rather than skip the
/// record: surfacing data-integrity problems beats serving a partial catalog.
pub fn normalize(raw: RawContent) -> Result<ContentRecord> {
    let frontmatter: Frontmatter = match raw.frontmatter {
        FrontmatterBlob::Text(text) => toml::from_str(&text)
            .with_context(|| format!("invalid frontmatter in `{}`", raw.slug))?,
        FrontmatterBlob::Parsed(table) => toml::Value::Table(table)
            .try_into()
            .with_context(|| format!("invalid frontmatter in `{}`", raw.slug))?,
    };

    if let Some(timestamp) = frontmatter.timestamp.as_deref() {
        DateTimeUtc::parse(timestamp).ok_or_else(|| {
            anyhow!("invalid timestamp `{timestamp}` in `{}`", raw.slug)
        })?;
    }

    let tags = split_tags(frontmatter.tags.as_deref().unwrap_or_default());
    let slug = frontmatter.slug.unwrap_or(raw.slug);
    let title = frontmatter.title.unwrap_or_else(|| slug.clone());

    Ok(ContentRecord {
        slug,
        title,
        timestamp: frontmatter.timestamp,
        tags,
        published: frontmatter.published,
        body: raw.body,
    })
}

/// Split a raw comma-delimited tag string: trim each segment, drop empty
/// ones, preserve order.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_text(slug: &str, frontmatter: &str) -> RawContent {
        RawContent {
            slug: slug.to_string(),
            frontmatter: FrontmatterBlob::Text(frontmatter.to_string()),
            body: String::new(),
        }
    }

    #[test]
    fn test_split_tags_basic() {
        assert_eq!(split_tags("x, y"), vec!["x", "y"]);
        assert_eq!(split_tags("remix,forms,  advanced  "), vec!["remix", "forms", "advanced"]);
    }

    #[test]
    fn test_split_tags_drops_empty_segments() {
        assert_eq!(split_tags(""), Vec::<String>::new());
        assert_eq!(split_tags(" , ,"), Vec::<String>::new());
        assert_eq!(split_tags("a,,b,"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_tags_preserves_order() {
        assert_eq!(split_tags("zulu, alpha, mike"), vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn test_normalize_text_blob() {
        let record = normalize(raw_text(
            "hello",
            "title = \"Hello World\"\ntimestamp = \"2024-01-15\"\ntags = \"intro, meta\"\npublished = true\n",
        ))
        .unwrap();

        assert_eq!(record.slug, "hello");
        assert_eq!(record.title, "Hello World");
        assert_eq!(record.timestamp.as_deref(), Some("2024-01-15"));
        assert_eq!(record.tags, vec!["intro", "meta"]);
        assert!(record.published);
    }

    #[test]
    fn test_normalize_parsed_blob() {
        let mut table = toml::Table::new();
        table.insert("title".into(), "From Rows".into());
        table.insert("published".into(), true.into());

        let record = normalize(RawContent {
            slug: "rows".into(),
            frontmatter: FrontmatterBlob::Parsed(table),
            body: "body text".into(),
        })
        .unwrap();

        assert_eq!(record.title, "From Rows");
        assert_eq!(record.timestamp, None);
        assert!(record.tags.is_empty());
        assert_eq!(record.body, "body text");
    }

    #[test]
    fn test_normalize_published_defaults_to_false() {
        let record = normalize(raw_text("draft", "title = \"Draft\"\n")).unwrap();
        assert!(!record.published);
    }

    #[test]
    fn test_normalize_frontmatter_slug_wins() {
        let record = normalize(raw_text("file-stem", "slug = \"custom-slug\"\n")).unwrap();
        assert_eq!(record.slug, "custom-slug");
    }

    #[test]
    fn test_normalize_title_falls_back_to_slug() {
        let record = normalize(raw_text("untitled", "published = true\n")).unwrap();
        assert_eq!(record.title, "untitled");
    }

    #[test]
    fn test_normalize_ignores_unknown_fields() {
        let record = normalize(raw_text(
            "combobox",
            "title = \"Combobox\"\ndescription = \"a searchable dropdown\"\nimg = \"/images/combobox.png\"\n",
        ))
        .unwrap();
        assert_eq!(record.title, "Combobox");
    }

    #[test]
    fn test_normalize_malformed_frontmatter_fails_with_slug() {
        let err = normalize(raw_text("broken", "title = \"unclosed\n")).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[test]
    fn test_normalize_invalid_timestamp_fails() {
        let err = normalize(raw_text("dated", "timestamp = \"last tuesday\"\n")).unwrap_err();
        assert!(format!("{err:#}").contains("last tuesday"));
    }
}
