//! Site configuration management for `loam.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `[base]`   | Site metadata (title, description, url)        |
//! | `[source]` | Content source backend (files or database)     |
//! | `[build]`  | Output paths, sitemap and rss toggles          |
//! | `[serve]`  | Development server (interface, port)           |
//! | `[store]`  | Persisted slots backing the local keyed store  |
//! | `[extra]`  | User-defined custom fields                     |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Site"
//! description = "Articles, guides, and cheatsheets"
//! url = "https://example.com"
//!
//! [source]
//! backend = "files"
//! content = "content"
//!
//! [build.rss]
//! enable = true
//!
//! [serve]
//! port = 4477
//! ```

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Defaults
// ============================================================================

/// Default values used by serde for omitted fields.
mod defaults {
    use std::path::PathBuf;

    pub fn r#true() -> bool {
        true
    }

    pub fn language() -> String {
        "en-US".into()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn database() -> PathBuf {
        "content.db".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn data() -> PathBuf {
        "_data".into()
    }

    pub fn sitemap_path() -> PathBuf {
        "sitemap.xml".into()
    }

    pub fn rss_path() -> PathBuf {
        "rss.xml".into()
    }

    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        4477
    }

    pub fn store() -> PathBuf {
        "store".into()
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing loam.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set from CLI after loading)
    #[serde(skip)]
    root: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Content source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Local keyed store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments.
    ///
    /// Resolves the project root (for `init <NAME>` the name is appended) and
    /// applies serve overrides.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        self.root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };
        self.config_path = self.root.join(&cli.config);

        if let Commands::Serve { interface, port } = &cli.command {
            if let Some(interface) = interface {
                self.serve.interface = interface.clone();
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        if self.build.rss.enable && self.base.url.as_deref().unwrap_or_default().is_empty() {
            bail!(ConfigError::Validation(
                "[base] url is required when [build.rss] enable = true".into()
            ));
        }
        if self.serve.port == 0 {
            bail!(ConfigError::Validation(
                "[serve] port must be non-zero".into()
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Root-relative path accessors
    // ------------------------------------------------------------------------

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Set the root directory directly (tests bypass the CLI).
    #[allow(dead_code)]
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.source.content)
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(&self.source.database)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.output_dir().join(&self.build.data)
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.output_dir().join(&self.build.sitemap.path)
    }

    pub fn rss_path(&self) -> PathBuf {
        self.output_dir().join(&self.build.rss.path)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join(&self.store.path)
    }
}

// ============================================================================
// [base] Section
// ============================================================================

/// `[base]` section - basic site metadata.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in listing pages and the rss channel.
    pub title: String,

    /// Site description for the rss channel.
    pub description: String,

    /// Base URL for absolute links in rss/sitemap.
    /// Required when `[build.rss].enable = true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en-US").
    #[serde(default = "defaults::language")]
    #[educe(Default = defaults::language())]
    pub language: String,
}

// ============================================================================
// [source] Section
// ============================================================================

/// Which backend supplies raw content records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    /// Markdown files with `+++` TOML frontmatter under the content dir.
    #[default]
    Files,
    /// Rows of the `content` table in a SQLite database.
    Database,
}

/// `[source]` section - content source selection.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Backend kind; both satisfy the same read contract.
    #[serde(default)]
    pub backend: SourceBackend,

    /// Content directory (files backend), relative to project root.
    #[serde(default = "defaults::content")]
    #[educe(Default = defaults::content())]
    pub content: PathBuf,

    /// Database file (database backend), relative to project root.
    #[serde(default = "defaults::database")]
    #[educe(Default = defaults::database())]
    pub database: PathBuf,
}

// ============================================================================
// [build] Section
// ============================================================================

/// `[build]` section - output paths and artifact toggles.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory, relative to project root.
    #[serde(default = "defaults::output")]
    #[educe(Default = defaults::output())]
    pub output: PathBuf,

    /// Listing data directory name inside the output directory.
    #[serde(default = "defaults::data")]
    #[educe(Default = defaults::data())]
    pub data: PathBuf,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// rss feed generation settings.
    #[serde(default)]
    pub rss: RssConfig,
}

/// `[build.sitemap]` settings.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path relative to the output directory.
    #[serde(default = "defaults::sitemap_path")]
    #[educe(Default = defaults::sitemap_path())]
    pub path: PathBuf,
}

/// `[build.rss]` settings.
///
/// Disabled by default: the feed needs `[base] url` to build absolute links.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    #[serde(default)]
    pub enable: bool,

    /// Output path relative to the output directory.
    #[serde(default = "defaults::rss_path")]
    #[educe(Default = defaults::rss_path())]
    pub path: PathBuf,
}

// ============================================================================
// [serve] Section
// ============================================================================

/// `[serve]` section - development server settings.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Interface to bind on.
    #[serde(default = "defaults::interface")]
    #[educe(Default = defaults::interface())]
    pub interface: String,

    /// Port to bind on.
    #[serde(default = "defaults::port")]
    #[educe(Default = defaults::port())]
    pub port: u16,
}

// ============================================================================
// [store] Section
// ============================================================================

/// `[store]` section - where the local keyed store persists its slots.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Slot directory, relative to project root.
    #[serde(default = "defaults::store")]
    #[educe(Default = defaults::store())]
    pub path: PathBuf,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_full() {
        let config = r#"
            [base]
            title = "My Site"
            description = "Articles and demos"
            url = "https://example.com"
            language = "en-US"

            [source]
            backend = "database"
            database = "site.db"

            [build]
            output = "dist"

            [build.rss]
            enable = true

            [serve]
            port = 8080
        "#;
        let config = SiteConfig::from_str(config).unwrap();

        assert_eq!(config.base.title, "My Site");
        assert_eq!(config.base.url, Some("https://example.com".to_string()));
        assert_eq!(config.source.backend, SourceBackend::Database);
        assert_eq!(config.source.database, PathBuf::from("site.db"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.rss.enable);
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_config_defaults() {
        let config = SiteConfig::from_str("").unwrap();

        assert_eq!(config.base.url, None);
        assert_eq!(config.base.language, "en-US");
        assert_eq!(config.source.backend, SourceBackend::Files);
        assert_eq!(config.source.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.sitemap.enable);
        assert!(!config.build.rss.enable);
        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.port, 4477);
        assert_eq!(config.store.path, PathBuf::from("store"));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test site"
            unknown_field = "should_fail"
        "#;
        let result = SiteConfig::from_str(config);

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("unknown field"));
    }

    #[test]
    fn test_backend_parsing() {
        let files = SiteConfig::from_str("[source]\nbackend = \"files\"").unwrap();
        assert_eq!(files.source.backend, SourceBackend::Files);

        let database = SiteConfig::from_str("[source]\nbackend = \"database\"").unwrap();
        assert_eq!(database.source.backend, SourceBackend::Database);

        assert!(SiteConfig::from_str("[source]\nbackend = \"ftp\"").is_err());
    }

    #[test]
    fn test_validate_rss_requires_url() {
        let mut config = SiteConfig::default();
        config.build.rss.enable = true;
        assert!(config.validate().is_err());

        config.base.url = Some("https://example.com".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_config_round_trips() {
        // init serializes the default config; it must parse back
        let serialized = toml::to_string_pretty(&SiteConfig::default()).unwrap();
        let parsed = SiteConfig::from_str(&serialized).unwrap();
        assert_eq!(parsed.serve.port, 4477);
    }

    #[test]
    fn test_path_accessors_join_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/srv/site"));

        assert_eq!(config.content_dir(), PathBuf::from("/srv/site/content"));
        assert_eq!(config.database_path(), PathBuf::from("/srv/site/content.db"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/site/public"));
        assert_eq!(config.data_dir(), PathBuf::from("/srv/site/public/_data"));
        assert_eq!(
            config.sitemap_path(),
            PathBuf::from("/srv/site/public/sitemap.xml")
        );
        assert_eq!(config.store_dir(), PathBuf::from("/srv/site/store"));
    }

    #[test]
    fn test_extra_fields() {
        let config = SiteConfig::from_str("[extra]\nanalytics_id = \"UA-12345\"").unwrap();
        assert_eq!(
            config.extra["analytics_id"],
            toml::Value::String("UA-12345".into())
        );
    }
}
