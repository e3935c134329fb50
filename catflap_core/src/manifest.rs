//! The manifest document holding all sync entries.

use crate::entry::SyncEntry;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read access to stored entries by object name.
///
/// The reconciler only ever looks entries up; writing results back is left
/// to whoever owns the manifest.
pub trait EntryLookup {
    /// Find the stored entry for an object.
    fn lookup(&self, name: &str) -> Option<&SyncEntry>;
}

impl EntryLookup for [SyncEntry] {
    fn lookup(&self, name: &str) -> Option<&SyncEntry> {
        self.iter().find(|e| e.name == name)
    }
}

impl EntryLookup for HashMap<String, SyncEntry> {
    fn lookup(&self, name: &str) -> Option<&SyncEntry> {
        self.get(name)
    }
}

/// A manifest document.
///
/// Entries live in the `sync` array. Other top-level fields of the document
/// are carried through load and save untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sync: Vec<SyncEntry>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Load a manifest from a JSON file.
    ///
    /// A missing file yields an empty manifest.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no manifest yet, starting empty");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)
            .map_err(|e| Error::invalid_manifest(path, e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for entry in &manifest.sync {
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::invalid_manifest(
                    path,
                    format!("duplicate entry: {}", entry.name),
                ));
            }
        }

        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON.
    ///
    /// The document is written to a temporary file next to `path` and renamed
    /// into place, so readers never observe a partial manifest.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp_file, self)?;
        temp_file.write_all(b"\n")?;
        temp_file.flush()?;
        temp_file.persist(path)?;

        tracing::debug!(path = %path.display(), entries = self.sync.len(), "saved manifest");
        Ok(())
    }

    /// Get the entry for an object.
    pub fn get(&self, name: &str) -> Option<&SyncEntry> {
        self.sync.lookup(name)
    }

    /// Store an entry, replacing any entry with the same name.
    pub fn upsert(&mut self, entry: SyncEntry) {
        match self.sync.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.sync.push(entry),
        }
    }

    /// Names of all tracked objects, in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sync.iter().map(|e| e.name.as_str())
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.sync.len()
    }

    /// Whether no objects are tracked.
    pub fn is_empty(&self) -> bool {
        self.sync.is_empty()
    }
}

impl EntryLookup for Manifest {
    fn lookup(&self, name: &str) -> Option<&SyncEntry> {
        self.get(name)
    }
}
