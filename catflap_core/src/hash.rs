//! Content hashing for sync object files.

use crate::error::{Error, Result};
use crate::fingerprint::followed_metadata;
use crate::paths::{clean_path, is_sidecar};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// MD5, the digest written by `md5sum` and expected by existing manifests.
    #[default]
    Md5,
    /// BLAKE3 with 256-bit output.
    Blake3,
}

impl Algorithm {
    /// Returns the string representation of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Blake3 => "blake3",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "blake3" | "blake3-256" => Ok(Algorithm::Blake3),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// Hash raw bytes, returning a lowercase hex digest.
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        match self {
            Algorithm::Md5 => hex::encode(Md5::digest(data)),
            Algorithm::Blake3 => hex::encode(blake3::hash(data).as_bytes()),
        }
    }

    /// Hash data from a reader, returning a lowercase hex digest.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
        match self {
            Algorithm::Md5 => {
                let mut hasher = Md5::new();
                std::io::copy(&mut reader, &mut hasher)?;
                Ok(hex::encode(hasher.finalize()))
            }
            Algorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                std::io::copy(&mut reader, &mut hasher)?;
                Ok(hex::encode(hasher.finalize().as_bytes()))
            }
        }
    }

    /// Hash a file's contents.
    pub fn hash_file(&self, path: &Path) -> Result<String> {
        let file = fs::File::open(path).map_err(|e| Error::hashing(path, e))?;
        self.hash_reader(file).map_err(|e| Error::hashing(path, e))
    }
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Hash every regular file of a sync object.
///
/// `name` is the object path relative to `base_dir`. Keys of the returned map
/// are `name`-prefixed paths in cleaned form; checksum sidecars are skipped.
/// The first file that cannot be read aborts the whole operation.
pub fn hash_object(
    base_dir: &Path,
    name: &str,
    algorithm: Algorithm,
) -> Result<BTreeMap<String, String>> {
    let root = base_dir.join(name);
    let metadata = fs::metadata(&root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found(&root),
        _ => Error::from(e),
    })?;

    let mut hashes = BTreeMap::new();

    if metadata.is_file() {
        let digest = algorithm.hash_file(&root)?;
        hashes.insert(clean_path(Path::new(name)), digest);
        return Ok(hashes);
    }

    let walker = ignore::WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = entry?;
        let entry_path = entry.path();

        if is_sidecar(entry_path) {
            continue;
        }

        // Links are hashed as their targets, matching the fingerprint
        if !followed_metadata(entry_path)?.is_file() {
            continue;
        }

        let relative = entry_path.strip_prefix(&root).unwrap_or(entry_path);
        let key = clean_path(&Path::new(name).join(relative));
        let digest = algorithm.hash_file(entry_path)?;
        tracing::trace!(path = %key, %digest, "hashed file");
        hashes.insert(key, digest);
    }

    tracing::debug!(
        object = name,
        files = hashes.len(),
        algorithm = algorithm.as_str(),
        "hashed sync object"
    );

    Ok(hashes)
}
