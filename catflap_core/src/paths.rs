//! Path helpers shared by the collector and the hasher.

use std::path::{Component, Path};

/// Suffix of the per-directory checksum sidecar files written by the transfer side.
pub const SIDECAR_SUFFIX: &str = ".rsyncsums";

/// Whether a path names a checksum sidecar and must be left out of fingerprints.
pub fn is_sidecar(path: &Path) -> bool {
    path.to_string_lossy().ends_with(SIDECAR_SUFFIX)
}

/// Lexically clean a path into its canonical form.
///
/// Drops `.` components, folds `name/..` pairs and repeated separators, and
/// renders with `/` separators. Nothing is resolved against the filesystem,
/// so symlinks are kept as written. An empty result becomes `.`.
pub fn clean_path(path: &Path) -> String {
    let mut absolute = false;
    let mut prefix = String::new();
    let mut parts: Vec<String> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => prefix = p.as_os_str().to_string_lossy().into_owned(),
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|last| last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..".to_string());
                }
                // `/..` is `/`
            }
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("{}/{}", prefix, joined),
        (false, true) if prefix.is_empty() => ".".to_string(),
        (false, _) => format!("{}{}", prefix, joined),
    }
}
