//! Content source backends.
//!
//! Both backends satisfy one read contract, [`ContentSource`], so the
//! resolver never cares where records physically live:
//!
//! | Backend        | Storage                                        |
//! |----------------|------------------------------------------------|
//! | `FileSource`   | `*.md` files with `+++` TOML frontmatter       |
//! | `SqliteSource` | rows of the `content` table in a SQLite file   |
//!
//! A failing source (missing directory, unreadable file, absent database) is
//! fatal for the resolution and propagates; it is never masked as an empty
//! catalog.

use super::record::{FrontmatterBlob, RawContent};
use crate::{
    config::{SiteConfig, SourceBackend},
    utils::slug::slugify,
};
use anyhow::{Context, Result, anyhow, bail};
use rusqlite::Connection;
use std::{fs, path::PathBuf};
use walkdir::WalkDir;

/// Fence line delimiting TOML frontmatter in content files.
const FRONTMATTER_FENCE: &str = "+++";

/// The single read contract every backend satisfies.
pub trait ContentSource {
    /// Return the current snapshot of all raw records, in no guaranteed
    /// order.
    fn fetch_all(&self) -> Result<Vec<RawContent>>;
}

/// Construct the backend selected in `[source]`.
pub fn from_config(config: &SiteConfig) -> Box<dyn ContentSource> {
    match config.source.backend {
        SourceBackend::Files => Box::new(FileSource::new(config.content_dir())),
        SourceBackend::Database => Box::new(SqliteSource::new(config.database_path())),
    }
}

// ============================================================================
// File Backend
// ============================================================================

/// Reads `*.md` files under the content directory.
///
/// The slug defaults to the slugified file stem; a `slug` frontmatter field
/// overrides it downstream.
pub struct FileSource {
    content_dir: PathBuf,
}

impl FileSource {
    pub fn new(content_dir: PathBuf) -> Self {
        Self { content_dir }
    }
}

impl ContentSource for FileSource {
    fn fetch_all(&self) -> Result<Vec<RawContent>> {
        if !self.content_dir.is_dir() {
            bail!("content directory not found: {}", self.content_dir.display());
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&self.content_dir) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }

            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let (frontmatter, body) = split_frontmatter(&text).ok_or_else(|| {
                anyhow!("missing `+++` frontmatter fences in {}", path.display())
            })?;

            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy())
                .unwrap_or_default();
            records.push(RawContent {
                slug: slugify(&stem),
                frontmatter: FrontmatterBlob::Text(frontmatter.to_owned()),
                body: body.to_owned(),
            });
        }

        Ok(records)
    }
}

/// Split a content file into its fenced TOML frontmatter and body.
///
/// The file must open with a `+++` line and carry a closing `+++` line;
/// everything after the closing fence is the body. Returns `None` when
/// either fence is missing.
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(FRONTMATTER_FENCE)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let end = rest.find("\n+++")?;
    let frontmatter = &rest[..end];

    let after = &rest[end + 1 + FRONTMATTER_FENCE.len()..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);

    Some((frontmatter, body))
}

// ============================================================================
// Database Backend
// ============================================================================

/// Schema expected by the database backend.
#[allow(dead_code)] // Reference for provisioning a content database
pub const CONTENT_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS content (
    slug      TEXT PRIMARY KEY,
    title     TEXT,
    timestamp TEXT,
    tags      TEXT,
    published INTEGER NOT NULL DEFAULT 0,
    body      TEXT NOT NULL DEFAULT ''
)";

/// Reads rows of the `content` table.
///
/// Columns are surfaced as a pre-parsed frontmatter table, so the normalizer
/// treats database rows and fenced file frontmatter identically. The
/// connection is opened per fetch: a resolution always sees the current
/// database state.
pub struct SqliteSource {
    database: PathBuf,
}

impl SqliteSource {
    pub fn new(database: PathBuf) -> Self {
        Self { database }
    }
}

impl ContentSource for SqliteSource {
    fn fetch_all(&self) -> Result<Vec<RawContent>> {
        // Check first: Connection::open would create an empty database.
        if !self.database.is_file() {
            bail!("content database not found: {}", self.database.display());
        }

        let conn = Connection::open(&self.database)
            .with_context(|| format!("failed to open {}", self.database.display()))?;

        let mut stmt =
            conn.prepare("SELECT slug, title, timestamp, tags, published, body FROM content")?;
        let rows = stmt.query_map([], |row| {
            let mut table = toml::Table::new();
            if let Some(title) = row.get::<_, Option<String>>(1)? {
                table.insert("title".into(), title.into());
            }
            if let Some(timestamp) = row.get::<_, Option<String>>(2)? {
                table.insert("timestamp".into(), timestamp.into());
            }
            if let Some(tags) = row.get::<_, Option<String>>(3)? {
                table.insert("tags".into(), tags.into());
            }
            table.insert("published".into(), row.get::<_, bool>(4)?.into());

            Ok(RawContent {
                slug: row.get(0)?,
                frontmatter: FrontmatterBlob::Parsed(table),
                body: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read content rows")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::record::normalize;
    use std::fs;
    use tempfile::TempDir;

    // ========================================================================
    // split_frontmatter Tests
    // ========================================================================

    #[test]
    fn test_split_frontmatter_basic() {
        let text = "+++\ntitle = \"Hi\"\n+++\n\nBody here.\n";
        let (frontmatter, body) = split_frontmatter(text).unwrap();
        assert_eq!(frontmatter, "title = \"Hi\"");
        assert_eq!(body, "\nBody here.\n");
    }

    #[test]
    fn test_split_frontmatter_crlf() {
        let text = "+++\r\ntitle = \"Hi\"\r\n+++\r\nBody";
        let (frontmatter, body) = split_frontmatter(text).unwrap();
        assert!(frontmatter.contains("title"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_frontmatter_missing_opening_fence() {
        assert!(split_frontmatter("title = \"Hi\"\n+++\n").is_none());
        assert!(split_frontmatter("").is_none());
    }

    #[test]
    fn test_split_frontmatter_missing_closing_fence() {
        assert!(split_frontmatter("+++\ntitle = \"Hi\"\n").is_none());
    }

    #[test]
    fn test_split_frontmatter_empty_body() {
        let (frontmatter, body) = split_frontmatter("+++\npublished = true\n+++").unwrap();
        assert_eq!(frontmatter, "published = true");
        assert_eq!(body, "");
    }

    // ========================================================================
    // FileSource Tests
    // ========================================================================

    #[test]
    fn test_file_source_fetch_all() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Hello World.md"),
            "+++\ntitle = \"Hello\"\npublished = true\n+++\nBody.\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not content").unwrap();

        let records = FileSource::new(dir.path().to_path_buf()).fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slug, "hello-world");
        assert_eq!(records[0].body, "Body.\n");
    }

    #[test]
    fn test_file_source_walks_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("posts")).unwrap();
        fs::write(
            dir.path().join("posts/deep.md"),
            "+++\npublished = true\n+++\n",
        )
        .unwrap();

        let records = FileSource::new(dir.path().to_path_buf()).fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slug, "deep");
    }

    #[test]
    fn test_file_source_missing_dir_is_an_error() {
        let result = FileSource::new(PathBuf::from("/nonexistent/content")).fetch_all();
        assert!(result.is_err());
    }

    #[test]
    fn test_file_source_unfenced_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.md"), "no fences here").unwrap();

        let err = FileSource::new(dir.path().to_path_buf())
            .fetch_all()
            .unwrap_err();
        assert!(format!("{err:#}").contains("bad.md"));
    }

    // ========================================================================
    // SqliteSource Tests
    // ========================================================================

    fn seed_database(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute(CONTENT_SCHEMA, []).unwrap();
        conn.execute(
            "INSERT INTO content (slug, title, timestamp, tags, published, body)
             VALUES ('hello', 'Hello', '2024-01-15', 'intro, meta', 1, 'Body.')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO content (slug, published) VALUES ('sparse', 0)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_sqlite_source_fetch_all() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("content.db");
        seed_database(&db);

        let mut records = SqliteSource::new(db).fetch_all().unwrap();
        records.sort_by(|a, b| a.slug.cmp(&b.slug));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slug, "hello");
        assert_eq!(records[0].body, "Body.");

        // Null columns simply stay out of the frontmatter table
        let FrontmatterBlob::Parsed(sparse) = &records[1].frontmatter else {
            panic!("expected parsed frontmatter");
        };
        assert!(!sparse.contains_key("title"));
        assert_eq!(sparse["published"], toml::Value::Boolean(false));
    }

    #[test]
    fn test_sqlite_source_missing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = SqliteSource::new(dir.path().join("absent.db")).fetch_all();
        assert!(result.is_err());
    }

    #[test]
    fn test_backends_normalize_identically() {
        // A database row and a fenced file with the same metadata must
        // produce the same ContentRecord.
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("content.db");
        seed_database(&db);
        fs::write(
            dir.path().join("hello.md"),
            "+++\ntitle = \"Hello\"\ntimestamp = \"2024-01-15\"\ntags = \"intro, meta\"\npublished = true\n+++\nBody.",
        )
        .unwrap();

        let from_db = SqliteSource::new(db)
            .fetch_all()
            .unwrap()
            .into_iter()
            .find(|r| r.slug == "hello")
            .unwrap();
        let from_file = FileSource::new(dir.path().to_path_buf())
            .fetch_all()
            .unwrap()
            .into_iter()
            .find(|r| r.slug == "hello")
            .unwrap();

        assert_eq!(normalize(from_db).unwrap(), normalize(from_file).unwrap());
    }
}
