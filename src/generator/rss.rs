//! rss feed generation.
//!
//! Builds an rss channel from the published catalog snapshot.

use crate::{
    catalog::{CatalogView, ContentRecord, resolver::LISTING_ROUTE},
    config::SiteConfig,
    log,
    utils::date::DateTimeUtc,
};
use anyhow::{Context, Result, anyhow};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::fs;

// ============================================================================
// Public API
// ============================================================================

/// Build rss feed if enabled in config.
pub fn build_rss(config: &SiteConfig, view: &CatalogView) -> Result<()> {
    if config.build.rss.enable {
        let xml = rss_xml(config, view)?;
        let rss_path = config.rss_path();

        if let Some(parent) = rss_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&rss_path, xml)
            .with_context(|| format!("Failed to write rss feed to {}", rss_path.display()))?;

        log!("rss"; "{}", rss_path.file_name().unwrap_or_default().to_string_lossy());
    }
    Ok(())
}

/// Render the feed.
///
/// Records without a timestamp are skipped: a feed item without a
/// publication date is useless to readers.
pub fn rss_xml(config: &SiteConfig, view: &CatalogView) -> Result<String> {
    let items: Vec<_> = view
        .records()
        .iter()
        .filter_map(|record| record_to_item(record, config))
        .collect();

    let channel = ChannelBuilder::default()
        .title(config.base.title.clone())
        .link(config.base.url.clone().unwrap_or_default())
        .description(config.base.description.clone())
        .language(config.base.language.clone())
        .generator("loam".to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a catalog record to an rss item.
/// Returns None when the record carries no timestamp.
fn record_to_item(record: &ContentRecord, config: &SiteConfig) -> Option<rss::Item> {
    let timestamp = record.timestamp.as_deref()?;
    let pub_date = DateTimeUtc::parse(timestamp).map(DateTimeUtc::to_rfc2822)?;

    let base_url = config
        .base
        .url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');
    let link = format!("{base_url}/{LISTING_ROUTE}/{}", record.slug);

    Some(
        ItemBuilder::default()
            .title(record.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .pub_date(pub_date)
            .build(),
    )
}

// ============================================================================
// Tests
// ============================================================================
