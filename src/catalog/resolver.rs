//! Catalog resolution.
//!
//! [`Catalog::resolve`] turns the source's current snapshot into an
//! immutable [`CatalogView`]: fetch, normalize every record (fail-fast),
//! keep published entries, sort newest first. The view answers the three
//! queries the site needs: filtered listing, tag facets, sitemap entries.
//!
//! # Ordering
//!
//! Records sort by timestamp descending. Records without a timestamp are
//! treated as "oldest" and sort last; ties order by title. Tag facets sort
//! ascending with a locale-leaning comparison (transliterated lowercase
//! first, raw string as tie-break).

use super::{
    record::{self, ContentRecord},
    source::ContentSource,
};
use crate::utils::timing::Timings;
use anyhow::Result;
use deunicode::deunicode;
use std::cmp::Ordering;

// ============================================================================
// Constants
// ============================================================================

/// Route of the catalog's own listing page, also the prefix for record
/// routes.
pub const LISTING_ROUTE: &str = "content";

/// Priority weight reported for every sitemap entry.
pub const SITEMAP_PRIORITY: f32 = 0.7;

/// Label under which the source read appears in `Server-Timing`.
const SOURCE_TIMING_LABEL: &str = "content-list";

// ============================================================================
// Catalog
// ============================================================================

/// Resolves fresh catalog snapshots from a content source.
pub struct Catalog<'a> {
    source: &'a dyn ContentSource,
}

impl<'a> Catalog<'a> {
    pub fn new(source: &'a dyn ContentSource) -> Self {
        Self { source }
    }

    /// Resolve a fresh snapshot from the source.
    ///
    /// Only the source read is timed; normalization and sorting are
    /// in-memory and deliberately excluded from the measurement. Every call
    /// re-reads the source, so a published flag flipped upstream is visible
    /// on the next resolution.
    ///
    /// # Errors
    ///
    /// Propagates source failures and any single record's normalization
    /// failure; the catalog is never silently replaced with an empty or
    /// partial one.
    pub fn resolve(&self, timings: &mut Timings) -> Result<CatalogView> {
        let raw = timings.time(SOURCE_TIMING_LABEL, || self.source.fetch_all())?;

        let mut records = raw
            .into_iter()
            .map(record::normalize)
            .collect::<Result<Vec<_>>>()?;

        records.retain(|record| record.published);
        records.sort_by(compare_records);

        Ok(CatalogView { records })
    }
}

// ============================================================================
// Catalog View
// ============================================================================

/// Immutable snapshot of the published catalog, newest first.
#[derive(Debug)]
pub struct CatalogView {
    records: Vec<ContentRecord>,
}

/// One sitemap entry: a site-relative route and its priority weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub route: String,
    pub priority: f32,
}

impl CatalogView {
    /// All records in the snapshot, in snapshot order.
    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    /// List records, optionally restricted to an exact (case-sensitive,
    /// trimmed) tag. A record without tags never matches a filter.
    pub fn list(&self, filter_tag: Option<&str>) -> Vec<&ContentRecord> {
        self.records
            .iter()
            .filter(|record| match filter_tag {
                Some(tag) => record.tags.iter().any(|t| t == tag),
                None => true,
            })
            .collect()
    }

    /// Look up a single record by slug.
    pub fn find(&self, slug: &str) -> Option<&ContentRecord> {
        self.records.iter().find(|record| record.slug == slug)
    }

    /// Deduplicated union of tags across the snapshot, sorted ascending.
    ///
    /// Computed over the full published catalog regardless of any active
    /// listing filter, so facet links stay globally available.
    pub fn tag_facets(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .records
            .iter()
            .flat_map(|record| record.tags.iter().cloned())
            .collect();
        tags.sort_by(|a, b| collate(a, b));
        tags.dedup();
        tags
    }

    /// Sitemap entries: the listing route first, then one route per record
    /// in snapshot order.
    ///
    /// Byte-stable output across runs is only as stable as the source
    /// snapshot itself.
    pub fn sitemap_entries(&self) -> Vec<SitemapEntry> {
        let mut entries = Vec::with_capacity(self.records.len() + 1);
        entries.push(SitemapEntry {
            route: LISTING_ROUTE.to_owned(),
            priority: SITEMAP_PRIORITY,
        });
        entries.extend(self.records.iter().map(|record| SitemapEntry {
            route: format!("{LISTING_ROUTE}/{}", record.slug),
            priority: SITEMAP_PRIORITY,
        }));
        entries
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Order records newest first; undated records sort last, ties by title.
///
/// ISO 8601 timestamps compare chronologically as strings, so no parsing is
/// needed here (timestamps were validated during normalization).
fn compare_records(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(ts_a), Some(ts_b)) => ts_b.cmp(ts_a).then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

/// Locale-leaning string comparison for facet presentation.
fn collate(a: &str, b: &str) -> Ordering {
    (deunicode(a).to_lowercase(), a).cmp(&(deunicode(b).to_lowercase(), b))
}

// ============================================================================
// Tests
// ============================================================================
