//! Reconciliation of collected fingerprints with stored manifest entries.

use crate::entry::SyncEntry;
use crate::error::Result;
use crate::fingerprint::{self, Fingerprint};
use crate::flags::SyncFlags;
use crate::hash::{self, Algorithm};
use crate::manifest::EntryLookup;
use std::path::{Path, PathBuf};

/// Merge a fingerprint into the prior entry for an object.
///
/// Starts from a copy of `prior` (or a fresh revision 1 entry), overwrites the
/// fingerprint fields, rewrites the flags when `flags` is given and drops the
/// legacy `csize`. If the result differs from `prior` in any field the revision
/// is bumped by one. Returns the entry and whether it changed.
pub fn merge_entry(
    name: &str,
    prior: Option<&SyncEntry>,
    fingerprint: &Fingerprint,
    flags: Option<&SyncFlags>,
) -> (SyncEntry, bool) {
    let mut entry = match prior {
        Some(prior) => prior.clone(),
        None => SyncEntry::new(name),
    };

    entry.set_fingerprint(fingerprint);

    if let Some(flags) = flags {
        flags.apply(&mut entry);
    }

    entry.csize = None;

    let changed = match prior {
        Some(prior) if entry != *prior => {
            entry.revision += 1;
            true
        }
        _ => false,
    };

    (entry, changed)
}

/// Computes updated manifest entries for objects under a base directory.
#[derive(Debug, Clone)]
pub struct Reconciler {
    base_dir: PathBuf,
    algorithm: Algorithm,
}

impl Reconciler {
    /// Create a reconciler for objects named relative to `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            algorithm: Algorithm::default(),
        }
    }

    /// Use a different content hash algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the content hash algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Path of an object on disk.
    pub fn object_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Collect the current fingerprint of an object.
    ///
    /// Directories get their mtime rewritten as a side effect.
    pub fn collect(&self, name: &str) -> Result<Fingerprint> {
        fingerprint::collect(&self.object_path(name))
    }

    /// Whether a stored entry still matches the object on disk.
    ///
    /// Uses the coarse comparison (name, size, count, mtime). Single-file
    /// entries recorded without a count match a file with no count check.
    /// Unparseable stored mtimes never match. A missing object fails with
    /// `Error::NotFound`.
    pub fn is_current(&self, entry: &SyncEntry) -> Result<bool> {
        let fingerprint = self.collect(&entry.name)?;

        let mut current = SyncEntry::new(entry.name.clone());
        current.set_fingerprint(&fingerprint);
        if entry.count.is_none() && self.object_path(&entry.name).is_file() {
            current.count = None;
        }

        Ok(current.same_fingerprint(entry).unwrap_or(false))
    }

    /// Look up the prior entry for `name` in `manifest` and reconcile it.
    ///
    /// The manifest is not modified; store the returned entry to keep it.
    pub fn update<L>(
        &self,
        manifest: &L,
        name: &str,
        flags: Option<&SyncFlags>,
        generate_hashes: bool,
    ) -> Result<SyncEntry>
    where
        L: EntryLookup + ?Sized,
    {
        self.reconcile(name, manifest.lookup(name), flags, generate_hashes)
    }

    /// Collect the object's fingerprint and reconcile it with `prior`.
    ///
    /// The object must exist; a missing path fails with `Error::NotFound`.
    pub fn reconcile(
        &self,
        name: &str,
        prior: Option<&SyncEntry>,
        flags: Option<&SyncFlags>,
        generate_hashes: bool,
    ) -> Result<SyncEntry> {
        let fingerprint = self.collect(name)?;
        self.reconcile_fingerprint(name, prior, &fingerprint, flags, generate_hashes)
    }

    /// Reconcile an already collected fingerprint with `prior`.
    ///
    /// With `generate_hashes`, content hashes are computed when the entry has
    /// none yet or its revision was just bumped. The revision decision is made
    /// before hashing, so new hashes alone never bump the revision.
    pub fn reconcile_fingerprint(
        &self,
        name: &str,
        prior: Option<&SyncEntry>,
        fingerprint: &Fingerprint,
        flags: Option<&SyncFlags>,
        generate_hashes: bool,
    ) -> Result<SyncEntry> {
        let (mut entry, changed) = merge_entry(name, prior, fingerprint, flags);

        if changed {
            tracing::info!(object = name, revision = entry.revision, "revision bumped");
        }

        if generate_hashes && (changed || entry.hashes.is_none()) {
            let hashes = hash::hash_object(&self.base_dir, name, self.algorithm)?;
            entry.hashes = Some(hashes);
        }

        Ok(entry)
    }
}
