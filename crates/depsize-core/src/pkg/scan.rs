//! Backend-free measurement of everything under the package roots.

use super::measure::{measure_path, par_map_ordered};
use super::report::SizeRecord;
use super::spec::normalize_name;
use crate::paths::PackageRootIndex;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// File suffixes that represent a package on their own.
const ARTIFACT_SUFFIXES: &[&str] = &[".py", ".dist-info", ".egg-info"];

fn is_artifact(path: &Path, name: &str) -> bool {
    path.is_dir() || ARTIFACT_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Entries to measure, in report order: roots in index order, entries sorted
/// by name within each root, and the first root to hold a name wins.
#[must_use]
pub fn scan_entries(index: &PackageRootIndex) -> Vec<(String, PathBuf)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for root in index.paths() {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(root = %root.display(), error = %err, "cannot read package root");
                continue;
            }
        };

        let mut found: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = entry.path();
                is_artifact(&path, &name).then_some((name, path))
            })
            .collect();
        found.sort();

        for (name, path) in found {
            if seen.insert(name.clone()) {
                out.push((name, path));
            }
        }
    }

    out
}

/// Measure every package-like entry under the roots, one record each.
#[must_use]
pub fn scan_roots(index: &PackageRootIndex, jobs: Option<usize>) -> Vec<SizeRecord> {
    let entries = scan_entries(index);
    tracing::debug!(entries = entries.len(), "scanning package roots");
    par_map_ordered(&entries, jobs, |(name, path)| {
        SizeRecord::new(name.as_str(), None, measure_path(path))
    })
}

/// Keep only records whose entry name is one of `names`.
///
/// Entry names are compared whole after normalization, so `six.py` is only
/// kept when `six.py` itself was asked for.
pub fn retain_named(records: &mut Vec<SizeRecord>, names: &BTreeSet<String>) {
    let wanted: HashSet<String> = names.iter().map(|n| normalize_name(n)).collect();
    records.retain(|r| wanted.contains(&normalize_name(&r.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn retain_named_normalizes() {
        let mut records = vec![
            SizeRecord::new("Typing_Extensions", None, Some(1.0)),
            SizeRecord::new("six.py", None, Some(0.1)),
            SizeRecord::new("numpy", None, Some(20.0)),
        ];
        let names: BTreeSet<String> = ["typing-extensions".to_string(), "six".to_string()]
            .into_iter()
            .collect();
        retain_named(&mut records, &names);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Typing_Extensions");
    }

    #[test]
    fn picks_dirs_and_known_suffixes() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("numpy")).unwrap();
        fs::write(root.path().join("numpy").join("core.so"), vec![0u8; 4096]).unwrap();
        fs::write(root.path().join("six.py"), b"x").unwrap();
        fs::write(root.path().join("distutils-precedence.pth"), b"x").unwrap();
        fs::write(root.path().join("old-1.0.egg-info"), b"x").unwrap();

        let index = PackageRootIndex::from_paths([root.path().to_path_buf()]);
        let records = scan_roots(&index, None);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["numpy", "old-1.0.egg-info", "six.py"]);
        assert!(records.iter().all(|r| r.size_mb.is_some() && r.version.is_none()));
    }

    #[test]
    fn first_root_wins_for_duplicate_names() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        fs::create_dir(a.path().join("pkg")).unwrap();
        fs::create_dir(b.path().join("pkg")).unwrap();
        fs::write(b.path().join("pkg").join("big"), vec![0u8; 1024 * 1024]).unwrap();
        fs::create_dir(b.path().join("extra")).unwrap();

        let index = PackageRootIndex::from_paths([a.path().to_path_buf(), b.path().to_path_buf()]);
        let records = scan_roots(&index, Some(2));
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["pkg", "extra"]);
        assert_eq!(records[0].size_mb, Some(0.0));
    }

    #[test]
    fn empty_index_scans_nothing() {
        assert!(scan_roots(&PackageRootIndex::default(), None).is_empty());
    }
}
