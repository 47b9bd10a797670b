//! Matching and sizing a list of packages.

use super::matcher::{find_artifact, MatchMode};
use super::report::SizeRecord;
use super::spec::{normalize_name, PackageRef};
use crate::paths::PackageRootIndex;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Knobs for a measuring pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureOptions {
    pub match_mode: MatchMode,
    /// Worker threads. `None` uses rayon's global pool.
    pub jobs: Option<usize>,
}

/// Size of one artifact in megabytes, `None` if it vanished or could not be read.
#[must_use]
pub fn measure_path(path: &Path) -> Option<f64> {
    match depsize_util::size_of(path) {
        Ok(size) => Some(size),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "artifact not measurable");
            None
        }
    }
}

fn measure_one(pkg: &PackageRef, index: &PackageRootIndex, mode: MatchMode) -> SizeRecord {
    let size = find_artifact(pkg.name(), index, mode).and_then(|a| measure_path(&a.path));
    SizeRecord::for_ref(pkg, size)
}

/// Run `f` over `items` in parallel and collect results in input order.
pub(crate) fn par_map_ordered<I, O, F>(items: &[I], jobs: Option<usize>, f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync + Send,
{
    let Some(jobs) = jobs else {
        return items.par_iter().map(&f).collect();
    };

    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| items.par_iter().map(&f).collect()),
        Err(err) => {
            tracing::warn!(error = %err, "could not start worker pool, measuring sequentially");
            items.iter().map(&f).collect()
        }
    }
}

/// Match and size every ref. The result has exactly one record per ref, in
/// the same order; unmatched or unreadable packages carry `size_mb = None`.
#[must_use]
pub fn measure(
    refs: &[PackageRef],
    index: &PackageRootIndex,
    options: MeasureOptions,
) -> Vec<SizeRecord> {
    let mode = options.match_mode;
    let records = par_map_ordered(refs, options.jobs, |pkg| measure_one(pkg, index, mode));
    tracing::debug!(
        packages = records.len(),
        measured = records.iter().filter(|r| r.size_mb.is_some()).count(),
        "measured packages"
    );
    records
}

/// Choose which packages to measure.
///
/// Without a filter the installed list is used as-is. With one, every
/// distinct filter name yields exactly one ref (in the filter's sorted
/// order); the version is taken from the installed list when that name was
/// reported. Spellings that normalize to the same name collapse into the
/// first one, so `typing-extensions` and `typing_extensions` are measured once.
#[must_use]
pub fn select_packages(
    installed: &[PackageRef],
    filter: Option<&BTreeSet<String>>,
) -> Vec<PackageRef> {
    let Some(filter) = filter else {
        return installed.to_vec();
    };

    let mut seen = HashSet::new();
    filter
        .iter()
        .filter(|wanted| seen.insert(normalize_name(wanted)))
        .filter_map(|wanted| {
            let version = installed
                .iter()
                .find(|pkg| pkg.is_named(wanted))
                .and_then(|pkg| pkg.version().map(str::to_string));
            PackageRef::new(wanted.as_str(), version).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pkg(name: &str, version: &str) -> PackageRef {
        PackageRef::new(name, Some(version.to_string())).unwrap()
    }

    fn filter(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn select_without_filter_is_identity() {
        let installed = vec![pkg("b", "1"), pkg("a", "2")];
        assert_eq!(select_packages(&installed, None), installed);
    }

    #[test]
    fn select_with_filter_keeps_one_ref_per_name() {
        let installed = vec![pkg("Requests", "2.31.0"), pkg("numpy", "1.26.0")];
        let selected = select_packages(&installed, Some(&filter(&["requests", "bar"])));

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].name(), "bar");
        assert_eq!(selected[0].version(), None);
        assert_eq!(selected[1].name(), "requests");
        assert_eq!(selected[1].version(), Some("2.31.0"));
    }

    #[test]
    fn select_skips_blank_filter_names() {
        let selected = select_packages(&[], Some(&filter(&["", "six"])));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "six");
    }

    #[test]
    fn select_collapses_spellings_of_one_name() {
        let installed = vec![pkg("typing_extensions", "4.9.0")];
        let selected = select_packages(
            &installed,
            Some(&filter(&["typing-extensions", "typing_extensions", "Typing_Extensions"])),
        );

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "Typing_Extensions");
        assert_eq!(selected[0].version(), Some("4.9.0"));
    }

    #[test]
    fn duplicate_spellings_are_not_double_counted() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("typing_extensions");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.bin"), vec![0u8; 2 * 1024 * 1024]).unwrap();

        let index = PackageRootIndex::from_paths([root.path().to_path_buf()]);
        let refs = select_packages(
            &[],
            Some(&filter(&["typing-extensions", "typing_extensions"])),
        );
        let summary =
            crate::pkg::report::aggregate(measure(&refs, &index, MeasureOptions::default()), 1.0);

        assert_eq!(summary.records.len(), 1);
        assert_eq!(format!("{:.2}", summary.total_mb), "2.00");
    }

    #[test]
    fn measure_keeps_order_and_length() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("foo")).unwrap();
        fs::write(root.path().join("foo").join("a.bin"), vec![0u8; 2 * 1024 * 1024]).unwrap();
        fs::write(root.path().join("foo-1.2.3.dist-info"), vec![0u8; 10 * 1024]).unwrap();
        fs::write(root.path().join("six.py"), vec![0u8; 1024]).unwrap();

        let index = PackageRootIndex::from_paths([root.path().to_path_buf()]);
        let refs = vec![pkg("zzz", "0"), pkg("foo", "1.2.3"), pkg("six", "1.16")];

        for jobs in [None, Some(1), Some(4)] {
            let records = measure(
                &refs,
                &index,
                MeasureOptions {
                    match_mode: MatchMode::Boundary,
                    jobs,
                },
            );
            let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["zzz", "foo", "six"]);
            assert_eq!(records[0].size_mb, None);
            assert_eq!(format!("{:.2}", records[1].size_mb.unwrap()), "2.00");
            assert_eq!(records[1].version.as_deref(), Some("1.2.3"));
            assert!(records[2].size_mb.unwrap() > 0.0);
        }
    }

    #[test]
    fn measure_with_no_roots_is_all_unmeasured() {
        let records = measure(
            &[pkg("a", "1"), pkg("b", "2")],
            &PackageRootIndex::default(),
            MeasureOptions::default(),
        );
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.size_mb.is_none()));
    }

    #[test]
    fn measure_path_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(measure_path(&dir.path().join("gone")), None);
    }
}
