//! Sitemap generation.
//!
//! Renders the catalog's sitemap entries as sitemap.xml for search engine
//! indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/content</loc>
//!     <priority>0.7</priority>
//!   </url>
//! </urlset>
//! ```

use crate::{
    catalog::{CatalogView, SitemapEntry},
    config::SiteConfig,
    log,
};
use anyhow::{Context, Result};
use std::fs;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Build sitemap if enabled in config.
pub fn build_sitemap(config: &SiteConfig, view: &CatalogView) -> Result<()> {
    if config.build.sitemap.enable {
        let xml = sitemap_xml(config, &view.sitemap_entries());
        let sitemap_path = config.sitemap_path();

        if let Some(parent) = sitemap_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&sitemap_path, xml).with_context(|| {
            format!("Failed to write sitemap to {}", sitemap_path.display())
        })?;

        log!("sitemap"; "{}", sitemap_path.file_name().unwrap_or_default().to_string_lossy());
    }
    Ok(())
}

/// Render sitemap XML for the given entries.
///
/// Routes are site-relative; the configured base URL is prepended to each.
pub fn sitemap_xml(config: &SiteConfig, entries: &[SitemapEntry]) -> String {
    let base_url = config
        .base
        .url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');

    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        let loc = format!("{base_url}/{}", entry.route);
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&loc)));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
