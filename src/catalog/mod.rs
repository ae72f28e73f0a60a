//! Content catalog: source backends, frontmatter normalization, and the
//! resolved listing view.
//!
//! # Architecture
//!
//! ```text
//! ContentSource (FileSource | SqliteSource)
//!        │ fetch_all()
//!        ▼
//!    RawContent ──► normalize() ──► ContentRecord
//!                                        │
//!                                        ▼
//!                 Catalog::resolve() ──► CatalogView
//!                                        │
//!                   ┌────────────────────┼──────────────────────┐
//!                   ▼                    ▼                      ▼
//!               list(tag)          tag_facets()         sitemap_entries()
//! ```
//!
//! A `CatalogView` is a snapshot: it is rebuilt from the source on every
//! resolution, so upstream edits are visible on the next request. Nothing is
//! cached across resolutions.

pub mod record;
pub mod resolver;
pub mod source;

pub use record::ContentRecord;
pub use resolver::{Catalog, CatalogView, SitemapEntry};
pub use source::ContentSource;
