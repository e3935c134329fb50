//! Manifest entries for sync objects.

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the transfer side treats existing files at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Replace the destination object wholesale.
    Replace,
}

/// One tracked object in the manifest, keyed by `name`.
///
/// Optional flags are absent rather than `false` when not requested. Fields
/// this crate does not know about are kept in `extra` and written back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntry {
    pub name: String,

    /// Entries written before revisions existed deserialize as 0.
    #[serde(default)]
    pub revision: u64,

    #[serde(default)]
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// ISO-8601, whole seconds.
    #[serde(default)]
    pub mtime: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_existing: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TransferMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<bool>,

    /// Cleaned file path to lowercase hex digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<BTreeMap<String, String>>,

    /// Legacy compressed size. Read from old manifests, never written.
    #[serde(default, skip_serializing)]
    pub csize: Option<u64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SyncEntry {
    /// Create a first-revision entry with no fingerprint yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: 1,
            size: 0,
            count: None,
            mtime: String::new(),
            ignore_existing: None,
            mode: None,
            purge: None,
            fuzzy: None,
            hashes: None,
            csize: None,
            extra: BTreeMap::new(),
        }
    }

    /// Overwrite size, count and mtime from a collected fingerprint.
    ///
    /// A stored mtime naming the same instant keeps its text, so manifests
    /// written with a local UTC offset do not churn.
    pub fn set_fingerprint(&mut self, fingerprint: &Fingerprint) {
        self.size = fingerprint.size;
        self.count = Some(fingerprint.count);
        let same_instant = self
            .parsed_mtime()
            .is_ok_and(|stored| stored == fingerprint.mtime);
        if !same_instant {
            self.mtime = fingerprint.mtime_string();
        }
    }

    /// Parse the stored mtime.
    pub fn parsed_mtime(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.mtime)
            .map_err(|_| Error::invalid_timestamp(&self.mtime))
    }

    /// Coarse comparison used to decide whether an object needs syncing.
    ///
    /// Only name, size, count and mtime are considered. Timestamps compare as
    /// instants, so `+00:00` and `Z` forms of the same second are equal.
    pub fn same_fingerprint(&self, other: &SyncEntry) -> Result<bool> {
        if self.name != other.name || self.size != other.size || self.count != other.count {
            return Ok(false);
        }
        Ok(self.parsed_mtime()? == other.parsed_mtime()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(mtime: &str) -> SyncEntry {
        SyncEntry {
            size: 30,
            count: Some(2),
            mtime: mtime.to_string(),
            ..SyncEntry::new("data")
        }
    }

    #[test]
    fn test_new_entry_starts_at_revision_one() {
        let entry = SyncEntry::new("obj");
        assert_eq!(entry.revision, 1);
        assert_eq!(entry.name, "obj");
        assert!(entry.hashes.is_none());
    }

    #[test]
    fn test_set_fingerprint_keeps_equivalent_mtime_text() {
        let fingerprint = Fingerprint {
            size: 30,
            count: 2,
            mtime: DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
        };

        let mut local = entry("2020-09-13T14:26:40+02:00");
        local.set_fingerprint(&fingerprint);
        assert_eq!(local.mtime, "2020-09-13T14:26:40+02:00");

        let mut stale = entry("2020-09-13T14:26:41+02:00");
        stale.set_fingerprint(&fingerprint);
        assert_eq!(stale.mtime, "2020-09-13T12:26:40Z");

        let mut fresh = SyncEntry::new("data");
        fresh.set_fingerprint(&fingerprint);
        assert_eq!(fresh.mtime, "2020-09-13T12:26:40Z");
    }

    #[test]
    fn test_same_fingerprint_ignores_flags_and_revision() {
        let a = entry("2020-09-13T12:26:40Z");
        let mut b = a.clone();
        b.revision = 7;
        b.purge = Some(true);
        b.hashes = Some(BTreeMap::from([("data/x".to_string(), "00".to_string())]));

        assert!(a.same_fingerprint(&b).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_fingerprint_compares_instants() {
        let a = entry("2020-09-13T12:26:40Z");
        let b = entry("2020-09-13T14:26:40+02:00");
        assert!(a.same_fingerprint(&b).unwrap());

        let c = entry("2020-09-13T12:26:41Z");
        assert!(!a.same_fingerprint(&c).unwrap());
    }

    #[test]
    fn test_same_fingerprint_detects_size_count_name() {
        let a = entry("2020-09-13T12:26:40Z");

        let mut b = a.clone();
        b.size += 1;
        assert!(!a.same_fingerprint(&b).unwrap());

        let mut c = a.clone();
        c.count = Some(3);
        assert!(!a.same_fingerprint(&c).unwrap());

        let mut d = a.clone();
        d.name = "other".to_string();
        assert!(!a.same_fingerprint(&d).unwrap());
    }

    #[test]
    fn test_same_fingerprint_invalid_mtime() {
        let a = entry("yesterday");
        let b = entry("2020-09-13T12:26:40Z");
        assert!(matches!(
            a.same_fingerprint(&b),
            Err(Error::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_serialize_omits_absent_fields_and_csize() {
        let mut e = entry("2020-09-13T12:26:40Z");
        e.csize = Some(99);
        e.mode = Some(TransferMode::Replace);
        e.ignore_existing = Some(true);

        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "data",
                "revision": 1,
                "size": 30,
                "count": 2,
                "mtime": "2020-09-13T12:26:40Z",
                "ignoreExisting": true,
                "mode": "replace",
            })
        );
    }

    #[test]
    fn test_deserialize_legacy_entry() {
        let e: SyncEntry = serde_json::from_value(json!({
            "name": "old.exe",
            "size": 5,
            "mtime": "2014-03-01T10:00:00+01:00",
            "csize": 3,
            "comment": "kept",
        }))
        .unwrap();

        assert_eq!(e.revision, 0);
        assert_eq!(e.count, None);
        assert_eq!(e.csize, Some(3));
        assert_eq!(e.extra.get("comment"), Some(&json!("kept")));

        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back["comment"], json!("kept"));
        assert!(back.get("csize").is_none());
    }
}
