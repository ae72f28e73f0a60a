//! Site initialization.
//!
//! Creates a new site skeleton: default configuration, content directory
//! with a sample post, and the store directory.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "loam.toml";

/// Sample post demonstrating the frontmatter shape.
const SAMPLE_POST: &str = r#"+++
title = "Hello World"
timestamp = "2024-01-15"
tags = "meta, writing"
published = true
+++

Welcome to your new site. Edit or delete this post to get started.
"#;

/// Create a new site with default structure.
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `loam init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(config)?;
    init_default_config(root)?;

    log!("init"; "site created at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create content and store directories plus a sample post
fn init_site_structure(config: &SiteConfig) -> Result<()> {
    let content_dir = config.content_dir();
    if content_dir.exists() {
        bail!(
            "Path `{}` already exists. Try `loam init <SITE_NAME>` instead.",
            content_dir.display()
        );
    }
    fs::create_dir_all(&content_dir)
        .with_context(|| format!("Failed to create {}", content_dir.display()))?;
    fs::write(content_dir.join("hello-world.md"), SAMPLE_POST)?;

    fs::create_dir_all(config.store_dir())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_site_scaffolds_everything() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());

        new_site(&config, false).unwrap();

        assert!(dir.path().join("loam.toml").is_file());
        assert!(dir.path().join("content/hello-world.md").is_file());
        assert!(dir.path().join("store").is_dir());

        // The generated config must parse back
        let reparsed = SiteConfig::from_path(&dir.path().join("loam.toml")).unwrap();
        assert_eq!(reparsed.serve.port, config.serve.port);
    }

    #[test]
    fn test_new_site_refuses_non_empty_dir_without_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("occupied.txt"), "x").unwrap();

        let mut config = SiteConfig::default();
        config.set_root(dir.path());

        assert!(new_site(&config, false).is_err());
    }

    #[test]
    fn test_sample_post_is_a_valid_record() {
        use crate::catalog::{record::normalize, source::FileSource, ContentSource};

        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        new_site(&config, false).unwrap();

        let records = FileSource::new(config.content_dir()).fetch_all().unwrap();
        assert_eq!(records.len(), 1);

        let record = normalize(records.into_iter().next().unwrap()).unwrap();
        assert_eq!(record.slug, "hello-world");
        assert_eq!(record.tags, vec!["meta", "writing"]);
        assert!(record.published);
    }
}
