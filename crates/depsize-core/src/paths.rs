//! Package root discovery.
//!
//! A [`PackageRootIndex`] is built once at startup and passed explicitly to
//! everything that needs to look at installed artifacts. It is never mutated
//! afterwards.

use crate::config::Config;
use crate::pkg::process::Toolchain;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Interpreter snippet printing the interpreter's site-packages directories as JSON.
const SITE_QUERY: &str = "import json, site; print(json.dumps(site.getsitepackages()))";

/// Interpreters asked for their site-packages, in order.
const INTERPRETERS: &[&str] = &["python3", "python"];

/// Virtual environment directory names looked for while walking up from cwd.
const VENV_DIR_NAMES: &[&str] = &[".venv", "venv"];

/// Where a package root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootSource {
    Configured,
    VirtualEnv,
    CondaPrefix,
    ProjectVenv,
    Interpreter,
    UserSite,
}

impl RootSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::VirtualEnv => "virtual-env",
            Self::CondaPrefix => "conda-prefix",
            Self::ProjectVenv => "project-venv",
            Self::Interpreter => "interpreter",
            Self::UserSite => "user-site",
        }
    }
}

/// A directory containing installed-package artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRoot {
    pub path: PathBuf,
    pub source: RootSource,
}

/// Ordered, de-duplicated, read-only list of package roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRootIndex {
    roots: Vec<PackageRoot>,
}

impl PackageRootIndex {
    /// Build an index from candidate directories. Candidates that do not exist
    /// or are not directories are dropped; duplicates (after canonicalization)
    /// keep their first position.
    #[must_use]
    pub fn from_candidates(candidates: impl IntoIterator<Item = (PathBuf, RootSource)>) -> Self {
        let mut roots: Vec<PackageRoot> = Vec::new();
        for (path, source) in candidates {
            if !path.is_dir() {
                tracing::debug!(path = %path.display(), "skipping missing package root");
                continue;
            }
            let path = dunce::canonicalize(&path).unwrap_or(path);
            if roots.iter().any(|r| r.path == path) {
                continue;
            }
            roots.push(PackageRoot { path, source });
        }
        Self { roots }
    }

    /// Index of explicitly configured directories.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::from_candidates(paths.into_iter().map(|p| (p, RootSource::Configured)))
    }

    /// Resolve the package roots for this run.
    ///
    /// Configured roots are used exclusively when present. Otherwise the active
    /// environment is taken from `$VIRTUAL_ENV`, `$CONDA_PREFIX` or a project
    /// `.venv`; only if none of those exist is a Python interpreter asked for
    /// its site-packages, with the per-user site directory appended.
    #[must_use]
    pub fn discover<T: Toolchain + ?Sized>(config: &Config, toolchain: &T) -> Self {
        if !config.roots.is_empty() {
            return Self::from_paths(config.roots.iter().cloned());
        }

        let mut candidates = Vec::new();
        for (var, source) in [
            ("VIRTUAL_ENV", RootSource::VirtualEnv),
            ("CONDA_PREFIX", RootSource::CondaPrefix),
        ] {
            if let Some(prefix) = std::env::var_os(var).filter(|v| !v.is_empty()) {
                candidates.extend(
                    site_packages_under(Path::new(&prefix))
                        .into_iter()
                        .map(|p| (p, source)),
                );
            }
        }
        if let Some(venv) = find_project_venv(&config.cwd) {
            candidates.extend(
                site_packages_under(&venv)
                    .into_iter()
                    .map(|p| (p, RootSource::ProjectVenv)),
            );
        }

        let index = Self::from_candidates(candidates);
        if !index.is_empty() {
            tracing::debug!(roots = index.len(), "using active environment");
            return index;
        }

        let mut candidates: Vec<(PathBuf, RootSource)> =
            query_interpreter(toolchain, config.backend_timeout)
                .into_iter()
                .map(|p| (p, RootSource::Interpreter))
                .collect();
        candidates.extend(
            user_site_packages()
                .into_iter()
                .map(|p| (p, RootSource::UserSite)),
        );
        Self::from_candidates(candidates)
    }

    #[must_use]
    pub fn roots(&self) -> &[PackageRoot] {
        &self.roots
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|r| r.path.as_path())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Site-packages directories inside an environment prefix.
///
/// Covers the POSIX layouts (`lib/pythonX.Y/site-packages`,
/// `lib64/pythonX.Y/site-packages`) and the Windows one (`Lib/site-packages`).
/// Results are sorted for a stable order across Python versions.
#[must_use]
pub fn site_packages_under(prefix: &Path) -> Vec<PathBuf> {
    let escaped = glob::Pattern::escape(&prefix.to_string_lossy());
    let mut found: Vec<PathBuf> = ["lib", "lib64"]
        .iter()
        .filter_map(|lib| glob::glob(&format!("{escaped}/{lib}/python*/site-packages")).ok())
        .flat_map(|paths| paths.filter_map(Result::ok))
        .filter(|p| p.is_dir())
        .collect();

    let windows = prefix.join("Lib").join("site-packages");
    if windows.is_dir() && !found.contains(&windows) {
        found.push(windows);
    }

    found.sort();
    found.dedup();
    found
}

/// Find a project virtual environment by walking up from `cwd`.
///
/// Returns the first `.venv` or `venv` directory that looks like an
/// environment (has a `pyvenv.cfg`).
#[must_use]
pub fn find_project_venv(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        for name in VENV_DIR_NAMES {
            let candidate = current.join(name);
            if candidate.join("pyvenv.cfg").is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Per-user site-packages directories (`~/.local/lib/python*/site-packages`).
#[must_use]
pub fn user_site_packages() -> Vec<PathBuf> {
    dirs_next::home_dir()
        .map(|home| site_packages_under(&home.join(".local")))
        .unwrap_or_default()
}

/// Ask the first available interpreter for its site-packages. Any failure
/// yields an empty list.
fn query_interpreter<T: Toolchain + ?Sized>(
    toolchain: &T,
    timeout: std::time::Duration,
) -> Vec<PathBuf> {
    let Some(python) = INTERPRETERS.iter().find_map(|p| toolchain.locate(p)) else {
        tracing::debug!("no python interpreter found for site-packages discovery");
        return Vec::new();
    };

    let output = match toolchain.run(&python, &["-c", SITE_QUERY], timeout) {
        Ok(out) if out.success() => out,
        Ok(out) => {
            tracing::debug!(code = ?out.exit_code, "interpreter site query failed");
            return Vec::new();
        }
        Err(err) => {
            tracing::debug!(error = %err, "interpreter site query failed");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<PathBuf>>(output.stdout.trim()) {
        Ok(paths) => paths,
        Err(err) => {
            tracing::debug!(error = %err, "unreadable interpreter site query output");
            Vec::new()
        }
    }
}
