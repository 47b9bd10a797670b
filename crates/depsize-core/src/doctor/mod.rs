//! Environment diagnostics for depsize.
//!
//! Used by `depsize doctor` to show which package roots were found and which
//! package managers are available, in the order the resolver would try them.
//!
//! ## Design Principles
//! - Backends are located, never run
//! - No network calls
//! - Roots come from the caller's [`PackageRootIndex`](crate::PackageRootIndex).
//!   Building that index may run a Python interpreter once to ask for its
//!   site-packages; collecting the report adds no runs of its own.

#![allow(clippy::doc_markdown)]

use crate::paths::PackageRoot;
use crate::pkg::BackendProbe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod collectors;

pub use collectors::*;

/// Report schema version. Bump when changing JSON structure.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Warning severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
}

/// A diagnostic warning with a stable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code (e.g., `NO_PACKAGE_ROOTS`).
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warn,
            message: message.into(),
        }
    }
}

/// Stable warning codes. These are part of the public API and must not change.
/// New codes may be added in future versions.
pub mod codes {
    pub const NO_PACKAGE_ROOTS: &str = "NO_PACKAGE_ROOTS";
    pub const NO_BACKEND: &str = "NO_BACKEND";
    pub const EXPORT_ONLY_BACKEND: &str = "EXPORT_ONLY_BACKEND";
    pub const PREFIX_MATCHING: &str = "PREFIX_MATCHING";
}

/// Runtime information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub version: String,
    pub schema_version: u32,
}

/// Operating system information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub arch: String,
}

/// Effective settings for this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsInfo {
    pub cwd: PathBuf,
    pub match_mode: String,
    pub backend_timeout_secs: f64,
    pub large_threshold_mb: f64,
    pub jobs: Option<usize>,
}

/// Complete doctor report.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    /// Schema version for this report format.
    pub report_schema_version: u32,
    pub runtime: RuntimeInfo,
    pub os: OsInfo,
    pub settings: SettingsInfo,
    pub roots: Vec<PackageRoot>,
    /// Every row of the backend table, in priority order.
    pub backends: Vec<BackendProbe>,
    /// The row the resolver would act on, if any.
    pub selected_backend: Option<String>,
    pub warnings: Vec<Warning>,
}

impl DoctorReport {
    /// Collect all diagnostic information.
    ///
    /// Backends are only looked up here, never run. The interpreter query that
    /// [`PackageRootIndex::discover`](crate::PackageRootIndex::discover) may
    /// make happens before this, when the caller builds `index`.
    #[must_use]
    pub fn collect<T: crate::pkg::Toolchain + ?Sized>(
        config: &crate::Config,
        toolchain: &T,
        index: &crate::PackageRootIndex,
    ) -> Self {
        let mut warnings = Vec::new();

        let runtime = collectors::collect_runtime();
        let os = collectors::collect_os();
        let settings = collectors::collect_settings(config, &mut warnings);
        let roots = collectors::collect_roots(index, &mut warnings);
        let backends = collectors::collect_backends(config, toolchain);
        let selected_backend = collectors::select_backend(&backends, &mut warnings);

        Self {
            report_schema_version: REPORT_SCHEMA_VERSION,
            runtime,
            os,
            settings,
            roots,
            backends,
            selected_backend,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::{MatchMode, PkgError, ProcessOutput, Toolchain};
    use crate::{Config, PackageRootIndex};
    use serial_test::serial;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Located(&'static [&'static str]);

    impl Toolchain for Located {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.0
                .contains(&program)
                .then(|| PathBuf::from(format!("/usr/bin/{program}")))
        }

        fn run(&self, p: &Path, _: &[&str], _: Duration) -> Result<ProcessOutput, PkgError> {
            panic!("doctor must not run {}", p.display())
        }
    }

    fn codes_of(report: &DoctorReport) -> Vec<&str> {
        report.warnings.iter().map(|w| w.code.as_str()).collect()
    }

    #[test]
    fn test_report_schema_version_is_stable() {
        assert_eq!(REPORT_SCHEMA_VERSION, 1);
    }

    #[test]
    fn test_warning_codes_are_uppercase() {
        let codes = [
            codes::NO_PACKAGE_ROOTS,
            codes::NO_BACKEND,
            codes::EXPORT_ONLY_BACKEND,
            codes::PREFIX_MATCHING,
        ];

        for code in codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Warning code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }

    #[test]
    fn empty_environment_warns() {
        let report = DoctorReport::collect(
            &Config::default(),
            &Located(&[]),
            &PackageRootIndex::default(),
        );
        assert!(report.roots.is_empty());
        assert_eq!(report.selected_backend, None);
        assert_eq!(report.backends.len(), crate::pkg::BACKENDS.len());
        assert_eq!(
            codes_of(&report),
            vec![codes::NO_PACKAGE_ROOTS, codes::NO_BACKEND]
        );
    }

    #[test]
    fn selects_first_available_row() {
        let dir = tempfile::tempdir().unwrap();
        let index = PackageRootIndex::from_paths([dir.path().to_path_buf()]);
        let report = DoctorReport::collect(&Config::default(), &Located(&["pip3", "uv"]), &index);

        assert_eq!(report.selected_backend.as_deref(), Some("uv"));
        assert!(report.warnings.is_empty());
        let pip = report.backends.iter().find(|b| b.name == "pip").unwrap();
        assert_eq!(pip.executable, Some(PathBuf::from("/usr/bin/pip3")));
    }

    #[test]
    fn export_only_and_prefix_are_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let index = PackageRootIndex::from_paths([dir.path().to_path_buf()]);
        let config = Config::default().with_match_mode(MatchMode::Prefix);
        let report = DoctorReport::collect(&config, &Located(&["conda"]), &index);

        assert_eq!(report.selected_backend.as_deref(), Some("conda"));
        assert_eq!(
            codes_of(&report),
            vec![codes::PREFIX_MATCHING, codes::EXPORT_ONLY_BACKEND]
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report_schema_version"], 1);
        assert_eq!(json["settings"]["match_mode"], "prefix");
    }

    /// Answers the interpreter site query and records every program it runs.
    struct Recording {
        site: PathBuf,
        runs: Mutex<Vec<PathBuf>>,
    }

    impl Toolchain for Recording {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            ["python3", "uv", "pip"]
                .contains(&program)
                .then(|| PathBuf::from(format!("/usr/bin/{program}")))
        }

        fn run(&self, p: &Path, _: &[&str], _: Duration) -> Result<ProcessOutput, PkgError> {
            self.runs.lock().unwrap().push(p.to_path_buf());
            Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: serde_json::to_string(&vec![&self.site]).unwrap(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    #[serial]
    fn only_root_discovery_runs_the_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site-packages");
        std::fs::create_dir(&site).unwrap();
        std::env::remove_var("VIRTUAL_ENV");
        std::env::remove_var("CONDA_PREFIX");

        let toolchain = Recording {
            site,
            runs: Mutex::new(Vec::new()),
        };
        let config = Config::new(dir.path().to_path_buf());
        let index = PackageRootIndex::discover(&config, &toolchain);
        assert_eq!(
            *toolchain.runs.lock().unwrap(),
            vec![PathBuf::from("/usr/bin/python3")]
        );

        let report = DoctorReport::collect(&config, &toolchain, &index);
        assert_eq!(toolchain.runs.lock().unwrap().len(), 1);
        assert_eq!(report.selected_backend.as_deref(), Some("uv"));
        assert!(report
            .roots
            .iter()
            .any(|r| r.source == crate::paths::RootSource::Interpreter));
    }
}
