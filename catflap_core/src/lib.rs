//! # Catflap Core
//!
//! Manifest reconciliation for synchronized file trees.
//!
//! Every tracked object (a file or a directory tree) has a manifest entry with
//! a fingerprint (total size, file count, latest mtime, optionally per-file
//! content hashes) and a revision number. Reconciling an object collects its
//! current fingerprint, merges it into the stored entry and bumps the revision
//! only when something changed, so clients can tell cheaply what to fetch.
//!
//! ## Features
//!
//! - Fingerprints of files and whole directory trees
//! - Revision tracking driven by full entry comparison
//! - Transfer flags (`i`, `r`, `P`, `f`) decoded into typed options
//! - Optional MD5 or BLAKE3 content hashes per file
//! - Executable-permission sanity checks
//!
//! ## Example
//!
//! ```no_run
//! use catflap_core::{Manifest, Reconciler, SyncFlags};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manifest = Manifest::load("catflap.json")?;
//! let reconciler = Reconciler::new("./public");
//!
//! // Reconcile one object and store the result
//! let flags = SyncFlags::parse("P");
//! let entry = reconciler.update(&manifest, "data", Some(&flags), true)?;
//! println!("{} is at revision {}", entry.name, entry.revision);
//! manifest.upsert(entry);
//!
//! manifest.save("catflap.json")?;
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod fingerprint;
mod flags;
mod hash;
mod manifest;
mod paths;
mod reconcile;
pub mod sanity;

pub use entry::{SyncEntry, TransferMode};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, collect, format_mtime};
pub use flags::SyncFlags;
pub use hash::{Algorithm, hash_object};
pub use manifest::{EntryLookup, Manifest};
pub use paths::{SIDECAR_SUFFIX, clean_path};
pub use reconcile::{Reconciler, merge_entry};
