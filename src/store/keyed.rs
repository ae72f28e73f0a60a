//! Name-scoped create/read-all store.
//!
//! A [`KeyedStore`] is an explicit handle over one persisted slot:
//! construct one per consumer with the store name it owns, rather than
//! reaching for ambient global state. The surface is narrow: `find_all` and
//! `create_one`, nothing else. No update, no delete, no deduplication.

use super::{id, slot::Slot};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored record: a generated id merged with the caller's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    /// Convenience accessor for a string payload field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// A create/read-all store over a single persisted slot.
pub struct KeyedStore<S: Slot> {
    name: String,
    slot: S,
}

impl<S: Slot> KeyedStore<S> {
    pub fn new(name: impl Into<String>, slot: S) -> Self {
        Self {
            name: name.into(),
            slot,
        }
    }

    /// All entries in insertion order.
    ///
    /// An absent, unreadable, or unparsable slot is the empty-store
    /// bootstrap state, not a failure: unlike the content catalog, this
    /// store has no remote source of truth to fall back to.
    pub fn find_all(&self) -> Vec<Entry> {
        let Ok(Some(raw)) = self.slot.read(&self.name) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Append a new entry built from `payload` plus a generated id.
    ///
    /// The generated id wins over any `id` key in the payload. The full
    /// sequence is written back synchronously before returning; the
    /// read-modify-write is not atomic across processes sharing the slot
    /// (last writer wins).
    pub fn create_one(&self, payload: Map<String, Value>) -> Result<Entry> {
        let mut fields = payload;
        fields.remove("id");
        let entry = Entry {
            id: id::generate(),
            fields,
        };

        let mut entries = self.find_all();
        entries.push(entry.clone());

        let raw = serde_json::to_string(&entries).context("failed to serialize store entries")?;
        self.slot.write(&self.name, &raw)?;

        Ok(entry)
    }
}

// ============================================================================
// Tests
// ============================================================================
