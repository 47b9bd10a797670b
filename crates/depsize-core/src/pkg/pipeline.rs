//! End-to-end run: resolve, select, measure, aggregate.

use super::backend::{BackendResolver, Resolution};
use super::measure::{measure, select_packages, MeasureOptions};
use super::process::Toolchain;
use super::report::{aggregate, Summary};
use crate::config::Config;
use crate::paths::PackageRootIndex;
use serde::Serialize;
use std::collections::BTreeSet;

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SizeRun {
    pub resolution: Resolution,
    pub summary: Summary,
}

/// Resolve installed packages with the first available backend, apply the
/// optional name filter, measure and aggregate.
///
/// Never fails: backend problems leave an empty package list and a message
/// on [`Resolution`], missing artifacts become unmeasured records.
#[must_use]
pub fn run_pipeline<T: Toolchain + ?Sized>(
    config: &Config,
    toolchain: &T,
    index: &PackageRootIndex,
    filter: Option<&BTreeSet<String>>,
) -> SizeRun {
    let resolution = BackendResolver::new(toolchain, config.backend_timeout).resolve();
    let refs = select_packages(&resolution.packages, filter);
    let records = measure(
        &refs,
        index,
        MeasureOptions {
            match_mode: config.match_mode,
            jobs: config.jobs,
        },
    );
    let summary = aggregate(records, config.large_threshold_mb);
    SizeRun {
        resolution,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::backend::BackendKind;
    use crate::pkg::error::{codes, PkgError};
    use crate::pkg::process::ProcessOutput;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    struct OnlyPip(&'static str);

    impl Toolchain for OnlyPip {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            (program == "pip").then(|| PathBuf::from("/fake/pip"))
        }

        fn run(&self, _: &Path, _: &[&str], _: Duration) -> Result<ProcessOutput, PkgError> {
            Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: self.0.to_string(),
                stderr: String::new(),
            })
        }
    }

    struct Nothing;

    impl Toolchain for Nothing {
        fn locate(&self, _: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, p: &Path, _: &[&str], _: Duration) -> Result<ProcessOutput, PkgError> {
            panic!("nothing should run, got {}", p.display())
        }
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foo").join("lib.so"), vec![0u8; 3 * 1024 * 1024])
            .unwrap();
        std::fs::write(dir.path().join("six.py"), vec![0u8; 2048]).unwrap();
        dir
    }

    #[test]
    fn full_run_with_standard_backend() {
        let root = site();
        let index = PackageRootIndex::from_paths([root.path().to_path_buf()]);
        let toolchain = OnlyPip(
            r#"[{"name":"foo","version":"1.0"},{"name":"six","version":"1.16.0"},{"name":"gone","version":"0.1"}]"#,
        );

        let run = run_pipeline(&Config::default(), &toolchain, &index, None);

        assert_eq!(run.resolution.kind, BackendKind::Standard);
        assert_eq!(run.summary.records.len(), 3);
        assert_eq!(run.summary.large.len(), 1);
        assert_eq!(run.summary.large[0].name, "foo");
        assert_eq!(run.summary.small_count, 1);
        assert_eq!(run.summary.unmeasured_count, 1);
    }

    #[test]
    fn filter_limits_and_fills_unknowns() {
        let root = site();
        let index = PackageRootIndex::from_paths([root.path().to_path_buf()]);
        let toolchain = OnlyPip(r#"[{"name":"foo","version":"1.0"}]"#);
        let filter: BTreeSet<String> = ["bar".to_string()].into_iter().collect();

        let run = run_pipeline(&Config::default(), &toolchain, &index, Some(&filter));

        let json: serde_json::Value =
            serde_json::from_str(&run.summary.to_export_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "bar", "version": null, "size_MB": null}])
        );
    }

    #[test]
    fn no_backend_still_summarizes() {
        let run = run_pipeline(
            &Config::default(),
            &Nothing,
            &PackageRootIndex::default(),
            None,
        );
        assert!(run.summary.records.is_empty());
        assert_eq!(run.resolution.error_code, Some(codes::BACKEND_UNAVAILABLE));
        assert!(run.summary.render_console().contains("0.00 MB"));
    }
}
