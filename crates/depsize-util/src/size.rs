//! On-disk size computation for installed artifacts.
//!
//! Directories are walked without following symlinks, and every regular file
//! is counted once per (device, inode) so hardlinked copies do not inflate
//! the total. Files that disappear while the walk is in progress count as 0.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Bytes in one megabyte (MiB) as reported by depsize.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Failure to size an artifact.
#[derive(Debug, Error)]
pub enum SizeError {
    #[error("path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SizeError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Convert a byte count to megabytes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Size of `path` in megabytes: recursive for directories, direct for files.
///
/// # Errors
/// Returns [`SizeError::NotFound`] if `path` does not exist, or
/// [`SizeError::Io`] if part of the tree cannot be read.
pub fn size_of(path: &Path) -> Result<f64, SizeError> {
    size_in_bytes(path).map(bytes_to_mb)
}

/// Size of `path` in bytes.
///
/// # Errors
/// See [`size_of`].
pub fn size_in_bytes(path: &Path) -> Result<u64, SizeError> {
    let meta = fs::metadata(path).map_err(|e| SizeError::from_io(path, e))?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }

    let mut visited = VisitedFiles::default();
    let mut total = 0u64;

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if is_vanished(err.io_error()) {
                    continue;
                }
                let at = err.path().unwrap_or(path).to_path_buf();
                return Err(SizeError::Io {
                    path: at,
                    source: err.into(),
                });
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) if is_vanished(err.io_error()) => continue,
            Err(err) => {
                return Err(SizeError::Io {
                    path: entry.path().to_path_buf(),
                    source: err.into(),
                })
            }
        };

        if visited.first_visit(&meta) {
            total += meta.len();
        }
    }

    Ok(total)
}

fn is_vanished(err: Option<&io::Error>) -> bool {
    err.is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Tracks file identities already counted during one walk.
#[derive(Default)]
struct VisitedFiles {
    seen: HashSet<(u64, u64)>,
}

impl VisitedFiles {
    #[cfg(unix)]
    fn first_visit(&mut self, meta: &fs::Metadata) -> bool {
        use std::os::unix::fs::MetadataExt;
        self.seen.insert((meta.dev(), meta.ino()))
    }

    // No stable inode on this platform; a non-following walk yields each path once.
    #[cfg(not(unix))]
    fn first_visit(&mut self, _meta: &fs::Metadata) -> bool {
        let _ = &self.seen;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_bytes(path: &Path, len: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn single_file_is_sized_directly() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("six-1.16.0.dist-info");
        write_bytes(&file, 10 * 1024);

        assert_eq!(size_in_bytes(&file).unwrap(), 10 * 1024);
        let mb = size_of(&file).unwrap();
        assert!((mb - 10.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn directory_sums_nested_files() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("foo");
        write_bytes(&pkg.join("__init__.py"), 100);
        write_bytes(&pkg.join("sub").join("a.py"), 250);
        write_bytes(&pkg.join("sub").join("deep").join("b.so"), 4096);

        assert_eq!(size_in_bytes(&pkg).unwrap(), 100 + 250 + 4096);
    }

    #[test]
    fn two_megabyte_package_reports_two() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("foo");
        write_bytes(&pkg.join("one.bin"), 1024 * 1024);
        write_bytes(&pkg.join("two.bin"), 1024 * 1024);

        let mb = size_of(&pkg).unwrap();
        assert_eq!(format!("{mb:.2}"), "2.00");
    }

    #[test]
    fn empty_directory_is_zero() {
        let dir = tempdir().unwrap();
        assert_eq!(size_in_bytes(dir.path()).unwrap(), 0);
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let err = size_of(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, SizeError::NotFound { .. }));
    }

    #[test]
    fn only_not_found_counts_as_vanished() {
        let gone = io::Error::from(io::ErrorKind::NotFound);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(is_vanished(Some(&gone)));
        assert!(!is_vanished(Some(&denied)));
        assert!(!is_vanished(None));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_not_found() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("six.py");
        std::os::unix::fs::symlink(dir.path().join("missing.py"), &link).unwrap();

        let err = size_in_bytes(&link).unwrap_err();
        assert!(matches!(err, SizeError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_inside_package_is_skipped() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        write_bytes(&pkg.join("data.bin"), 500);
        std::os::unix::fs::symlink(dir.path().join("missing"), pkg.join("broken")).unwrap();

        assert_eq!(size_in_bytes(&pkg).unwrap(), 500);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed_or_counted() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        write_bytes(&pkg.join("data.bin"), 1000);
        let outside = dir.path().join("outside");
        write_bytes(&outside.join("big.bin"), 50_000);

        std::os::unix::fs::symlink(&outside, pkg.join("link-dir")).unwrap();
        std::os::unix::fs::symlink(pkg.join("data.bin"), pkg.join("link-file")).unwrap();

        assert_eq!(size_in_bytes(&pkg).unwrap(), 1000);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        write_bytes(&pkg.join("a").join("f.txt"), 10);
        std::os::unix::fs::symlink(&pkg, pkg.join("a").join("loop")).unwrap();

        assert_eq!(size_in_bytes(&pkg).unwrap(), 10);
    }

    #[cfg(unix)]
    #[test]
    fn hardlinks_count_once() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        write_bytes(&pkg.join("lib.so"), 2048);
        fs::hard_link(pkg.join("lib.so"), pkg.join("lib-copy.so")).unwrap();

        assert_eq!(size_in_bytes(&pkg).unwrap(), 2048);
    }
}
