//! Fingerprint collection for sync objects.

use crate::error::{Error, Result};
use crate::paths::is_sidecar;
use chrono::{DateTime, SecondsFormat, Utc};
use filetime::FileTime;
use std::fs;
use std::path::Path;

/// Size, file count and latest mtime of a sync object as found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// Total byte size of all regular files.
    pub size: u64,
    /// Number of non-directory entries (1 for a single file).
    pub count: u64,
    /// Latest modification time, whole seconds.
    pub mtime: DateTime<Utc>,
}

impl Fingerprint {
    /// The mtime as stored in manifest entries.
    pub fn mtime_string(&self) -> String {
        format_mtime(self.mtime)
    }
}

/// Format a timestamp as ISO-8601 with no fractional seconds.
pub fn format_mtime(mtime: DateTime<Utc>) -> String {
    mtime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a file time to a whole-second UTC timestamp.
fn to_datetime(time: FileTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.unix_seconds(), 0)
        .ok_or_else(|| Error::invalid_timestamp(format!("{} seconds", time.unix_seconds())))
}

/// Collect the fingerprint of a file or directory tree.
///
/// For a directory, every descendant except checksum sidecars is visited.
/// The directory's own mtime is then set to the latest mtime found, keeping
/// its access time, so later collections see a stable value.
pub fn collect(path: &Path) -> Result<Fingerprint> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found(path));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.is_file() {
        return Ok(Fingerprint {
            size: metadata.len(),
            count: 1,
            mtime: to_datetime(FileTime::from_last_modification_time(&metadata))?,
        });
    }

    if !metadata.is_dir() {
        return Err(Error::unsupported_file_type(path));
    }

    collect_directory(path, &metadata)
}

/// Stat a walked entry, following symlinks so a link measures as its target.
///
/// Dangling links fall back to the link itself.
pub(crate) fn followed_metadata(path: &Path) -> Result<fs::Metadata> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(fs::symlink_metadata(path)?),
        Err(e) => Err(e.into()),
    }
}

fn collect_directory(path: &Path, metadata: &fs::Metadata) -> Result<Fingerprint> {
    let mut size = 0u64;
    let mut count = 0u64;
    let mut latest = FileTime::from_last_modification_time(metadata);

    let walker = ignore::WalkBuilder::new(path)
        .standard_filters(false) // Every file counts, hidden or ignored
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = entry?;
        let entry_path = entry.path();

        if is_sidecar(entry_path) {
            continue;
        }

        let entry_metadata = followed_metadata(entry_path)?;
        let mtime = FileTime::from_last_modification_time(&entry_metadata);
        if mtime > latest {
            latest = mtime;
        }

        if !entry_metadata.is_dir() {
            size += entry_metadata.len();
            count += 1;
        }
    }

    if latest != FileTime::from_last_modification_time(metadata) {
        let atime = FileTime::from_last_access_time(metadata);
        filetime::set_file_times(path, atime, latest)?;
        tracing::debug!(
            path = %path.display(),
            mtime = latest.unix_seconds(),
            "updated directory mtime"
        );
    }

    Ok(Fingerprint {
        size,
        count,
        mtime: to_datetime(latest)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn at(secs: i64) -> FileTime {
        FileTime::from_unix_time(secs, 0)
    }

    fn utc(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_collect_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("five.txt");
        fs::write(&file, b"12345").unwrap();
        filetime::set_file_mtime(&file, at(1_600_000_000)).unwrap();

        let fp = collect(&file).unwrap();
        assert_eq!(fp.size, 5);
        assert_eq!(fp.count, 1);
        assert_eq!(fp.mtime, utc(1_600_000_000));
        assert_eq!(fp.mtime_string(), "2020-09-13T12:26:40Z");
    }

    #[test]
    fn test_collect_drops_subsecond_precision() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        filetime::set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 750_000_000))
            .unwrap();

        let fp = collect(&file).unwrap();
        assert_eq!(fp.mtime, utc(1_600_000_000));
    }

    #[test]
    fn test_collect_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("ten.bin"), [0u8; 10]).unwrap();
        fs::write(dir.join("twenty.bin"), [0u8; 20]).unwrap();
        filetime::set_file_mtime(dir.join("ten.bin"), at(1_600_000_100)).unwrap();
        filetime::set_file_mtime(dir.join("twenty.bin"), at(1_600_000_200)).unwrap();
        filetime::set_file_times(&dir, at(1_700_000_000), at(1_600_000_000)).unwrap();

        let fp = collect(&dir).unwrap();
        assert_eq!(fp.size, 30);
        assert_eq!(fp.count, 2);
        assert_eq!(fp.mtime, utc(1_600_000_200));

        // The directory itself now carries the latest mtime, atime untouched
        let meta = fs::metadata(&dir).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), at(1_600_000_200));
        assert_eq!(FileTime::from_last_access_time(&meta), at(1_700_000_000));
    }

    #[test]
    fn test_collect_directory_includes_subdirectory_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        let sub = dir.join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("a"), b"abc").unwrap();
        filetime::set_file_mtime(sub.join("a"), at(1_600_000_000)).unwrap();
        filetime::set_file_mtime(&sub, at(1_600_000_500)).unwrap();
        filetime::set_file_mtime(&dir, at(1_600_000_000)).unwrap();

        let fp = collect(&dir).unwrap();
        assert_eq!(fp.size, 3);
        assert_eq!(fp.count, 1);
        assert_eq!(fp.mtime, utc(1_600_000_500));
    }

    #[test]
    fn test_collect_directory_skips_sidecars() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("data"), b"1234").unwrap();
        fs::write(dir.join(".rsyncsums"), b"a very long sidecar").unwrap();
        filetime::set_file_mtime(dir.join("data"), at(1_600_000_000)).unwrap();
        filetime::set_file_mtime(dir.join(".rsyncsums"), at(1_650_000_000)).unwrap();
        filetime::set_file_mtime(&dir, at(1_600_000_000)).unwrap();

        let fp = collect(&dir).unwrap();
        assert_eq!(fp.size, 4);
        assert_eq!(fp.count, 1);
        assert_eq!(fp.mtime, utc(1_600_000_000));
    }

    #[test]
    fn test_collect_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("empty");
        fs::create_dir(&dir).unwrap();
        filetime::set_file_mtime(&dir, at(1_600_000_000)).unwrap();

        let fp = collect(&dir).unwrap();
        assert_eq!(fp.size, 0);
        assert_eq!(fp.count, 0);
        assert_eq!(fp.mtime, utc(1_600_000_000));
    }

    #[test]
    fn test_collect_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a"), b"a").unwrap();

        let first = collect(&dir).unwrap();
        let second = collect(&dir).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[cfg(unix)]
    fn test_collect_directory_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a"), [0u8; 10]).unwrap();
        std::os::unix::fs::symlink("a", dir.join("b")).unwrap();
        // A link to a directory counts as a directory, not a file
        std::os::unix::fs::symlink("sub", dir.join("c")).unwrap();
        filetime::set_file_mtime(dir.join("a"), at(1_600_000_300)).unwrap();
        filetime::set_file_mtime(dir.join("sub"), at(1_600_000_000)).unwrap();
        filetime::set_file_mtime(&dir, at(1_600_000_000)).unwrap();

        let fp = collect(&dir).unwrap();
        assert_eq!(fp.size, 20);
        assert_eq!(fp.count, 2);
        assert_eq!(fp.mtime, utc(1_600_000_300));
    }

    #[test]
    fn test_collect_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let result = collect(&temp_dir.path().join("nonexistent"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
