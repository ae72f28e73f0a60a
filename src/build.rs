//! Site build pipeline.
//!
//! Resolves one catalog snapshot and writes every derived artifact from it:
//! listing data JSON, sitemap, and rss feed. There is one resolution per
//! build, so all artifacts agree with each other.

use crate::{
    catalog::{Catalog, CatalogView, source},
    config::SiteConfig,
    generator::{rss::build_rss, sitemap::build_sitemap},
    log,
    utils::timing::Timings,
};
use anyhow::{Context, Result};
use std::fs;

/// Resolve the catalog and write all enabled artifacts.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let mut timings = Timings::new();
    let source = source::from_config(config);
    let catalog = Catalog::new(source.as_ref());
    let view = catalog.resolve(&mut timings)?;

    write_listing_data(config, &view)?;
    build_sitemap(config, &view)?;
    build_rss(config, &view)?;

    log!("build"; "{} published entries ({})", view.records().len(), timings.header_value());
    Ok(())
}

/// Write the resolved listing view and tag facets as JSON data files.
fn write_listing_data(config: &SiteConfig, view: &CatalogView) -> Result<()> {
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let posts = serde_json::to_string_pretty(view.records())?;
    fs::write(data_dir.join("posts.json"), posts)?;

    let tags = serde_json::to_string_pretty(&view.tag_facets())?;
    fs::write(data_dir.join("tags.json"), tags)?;

    log!("data"; "posts.json, tags.json");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
