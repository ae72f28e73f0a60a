//! Persisted string slots backing the keyed store.

use anyhow::{Context, Result};
use std::{fs, io, path::PathBuf};

/// A string-keyed persisted container slot.
pub trait Slot {
    /// Read the slot value; `None` if the slot has never been written.
    fn read(&self, name: &str) -> Result<Option<String>>;

    /// Replace the slot value.
    fn write(&self, name: &str, value: &str) -> Result<()>;
}

/// File-backed slots: one `<name>.json` file per store name under a root
/// directory.
pub struct DirSlot {
    root: PathBuf,
}

impl DirSlot {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn slot_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_name(name)))
    }
}

impl Slot for DirSlot {
    fn read(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(name)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read store slot `{name}`")),
        }
    }

    fn write(&self, name: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create store directory {}", self.root.display())
        })?;
        fs::write(self.slot_path(name), value)
            .with_context(|| format!("failed to write store slot `{name}`"))
    }
}

/// Map a store name to a safe file stem. Store names like `combobox:genres`
/// carry characters some filesystems reject.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
