//! Permission sanity checks for tracked objects.
//!
//! Directories and `.exe` files are expected to carry the executable bit.
//! These checks only report; nothing on disk is changed.

use crate::error::Result;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A path that should be executable but is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionWarning {
    pub path: PathBuf,
}

impl fmt::Display for PermissionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: {} is not marked executable (chmod +x {}).",
            self.path.display(),
            self.path.display()
        )
    }
}

/// Receives sanity warnings.
pub trait Reporter {
    fn warn(&mut self, warning: &PermissionWarning);
}

/// Writes warnings as plain lines to stderr.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn warn(&mut self, warning: &PermissionWarning) {
        let _ = writeln!(std::io::stderr(), "{}", warning);
    }
}

impl Reporter for Vec<PermissionWarning> {
    fn warn(&mut self, warning: &PermissionWarning) {
        self.push(warning.clone());
    }
}

/// Whether a file name carries the `.exe` suffix, in any case.
fn has_exe_suffix(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(".exe"))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    // No executable bit to check outside Unix
    true
}

fn is_permission_denied(err: &ignore::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
}

fn check_entry(path: &Path, metadata: &fs::Metadata) -> Option<PermissionWarning> {
    let wants_exec = metadata.is_dir() || has_exe_suffix(path);
    if wants_exec && !is_executable(metadata) {
        Some(PermissionWarning {
            path: path.to_path_buf(),
        })
    } else {
        None
    }
}

/// Check a tracked object and everything under it.
///
/// A missing path is trivially fine. Each path is reported at most once.
pub fn check(path: &Path) -> Result<Vec<PermissionWarning>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Ok(check_entry(path, &metadata).into_iter().collect());
    }

    let mut warnings = Vec::new();
    let walker = ignore::WalkBuilder::new(path)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for entry in walker {
        // Children of a directory without the x bit cannot be stat'ed; the
        // directory itself has already been reported by then.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_permission_denied(&e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let entry_metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) if is_permission_denied(&e) => {
                tracing::debug!(path = %entry.path().display(), "skipping unreadable entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(warning) = check_entry(entry.path(), &entry_metadata) {
            warnings.push(warning);
        }
    }

    tracing::debug!(
        path = %path.display(),
        warnings = warnings.len(),
        "sanity check finished"
    );

    Ok(warnings)
}

/// Check a tracked object and hand every warning to `reporter`.
///
/// Returns the number of warnings.
pub fn check_and_report<R: Reporter + ?Sized>(path: &Path, reporter: &mut R) -> Result<usize> {
    let warnings = check(path)?;
    for warning in &warnings {
        reporter.warn(warning);
    }
    Ok(warnings.len())
}
