//! Installed-package list acquisition.
//!
//! Backends are described by a single ordered table ([`BACKENDS`]). Each row
//! names the executables that reveal the tool, what to run, and how to turn
//! its output into [`PackageRef`]s, or, for tools that cannot be scripted,
//! the export command the user should run instead. The resolver walks the
//! table in order and acts on the first row whose tool is present.
//!
//! Every failure is recoverable: the resolver always returns a
//! [`Resolution`], possibly empty, with a message explaining why.

use super::error::PkgError;
use super::process::Toolchain;
use super::spec::PackageRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Lines of backend stderr kept in failure messages.
const STDERR_TAIL_LINES: usize = 5;

/// Message used when no row of the table matched.
pub const NOT_FOUND_MESSAGE: &str =
    "No supported package manager found (looked for uv, pip, poetry, conda)";

/// Role of a backend in the priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Fast resolver preferred when present.
    Primary,
    /// Baseline resolver.
    Standard,
    /// Can only report its state through a manual export.
    ExportOnly,
    /// Nothing usable, or the backend failed.
    Unknown,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Standard => "standard",
            Self::ExportOnly => "export-only",
            Self::Unknown => "unknown",
        }
    }
}

/// Output normalizer: backend stdout to package references.
pub type Normalizer = fn(&str) -> Result<Vec<PackageRef>, PkgError>;

/// What to do once a backend's tool is found.
#[derive(Debug, Clone, Copy)]
pub enum BackendAction {
    /// Run the tool with `args` and normalize its stdout.
    List {
        args: &'static [&'static str],
        normalize: Normalizer,
    },
    /// The tool cannot be scripted; tell the user how to export.
    Guidance { message: &'static str },
}

/// One row of the backend decision table.
#[derive(Debug, Clone, Copy)]
pub struct BackendSpec {
    pub name: &'static str,
    pub kind: BackendKind,
    /// Executables probed on the search path, first hit wins.
    pub probe: &'static [&'static str],
    pub action: BackendAction,
}

/// The decision table, in priority order.
pub const BACKENDS: &[BackendSpec] = &[
    BackendSpec {
        name: "uv",
        kind: BackendKind::Primary,
        probe: &["uv"],
        action: BackendAction::List {
            args: &["pip", "list", "--format=json"],
            normalize: normalize_pip_json,
        },
    },
    BackendSpec {
        name: "pip",
        kind: BackendKind::Standard,
        probe: &["pip", "pip3"],
        action: BackendAction::List {
            args: &["list", "--format=json"],
            normalize: normalize_pip_json,
        },
    },
    BackendSpec {
        name: "poetry",
        kind: BackendKind::ExportOnly,
        probe: &["poetry"],
        action: BackendAction::Guidance {
            message: "Poetry detected, but its environment cannot be listed directly. \
                      Run `poetry export -f requirements.txt --output requirements.txt --without-hashes` \
                      and pass the file with --from",
        },
    },
    BackendSpec {
        name: "conda",
        kind: BackendKind::ExportOnly,
        probe: &["conda"],
        action: BackendAction::Guidance {
            message: "Conda detected, but its environment cannot be listed directly. \
                      Run `conda list --export > requirements.txt` \
                      and pass the file with --from",
        },
    },
];

#[derive(Deserialize)]
struct PipListEntry {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// Normalize `pip list --format=json` / `uv pip list --format=json` output:
/// an array of `{"name": ..., "version": ...}` objects.
pub fn normalize_pip_json(stdout: &str) -> Result<Vec<PackageRef>, PkgError> {
    if stdout.trim().is_empty() {
        return Err(PkgError::malformed(
            "Error parsing JSON output: backend printed nothing",
        ));
    }
    let entries: Vec<PipListEntry> = serde_json::from_str(stdout)?;
    entries
        .into_iter()
        .map(|e| {
            PackageRef::new(e.name, e.version).map_err(|_| {
                PkgError::malformed("Error parsing JSON output: entry with empty name")
            })
        })
        .collect()
}

/// Outcome of backend resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub packages: Vec<PackageRef>,
    pub kind: BackendKind,
    /// Table row that produced this result, if any tool was found.
    pub backend: Option<&'static str>,
    /// Guidance or failure explanation for the user.
    pub message: Option<String>,
    /// Stable code of the failure, if one occurred.
    pub error_code: Option<&'static str>,
}

impl Resolution {
    fn listed(spec: &BackendSpec, packages: Vec<PackageRef>) -> Self {
        Self {
            packages,
            kind: spec.kind,
            backend: Some(spec.name),
            message: None,
            error_code: None,
        }
    }

    fn failed(spec: &BackendSpec, err: &PkgError) -> Self {
        Self {
            packages: Vec::new(),
            kind: BackendKind::Unknown,
            backend: Some(spec.name),
            message: Some(format!("{}: {}", spec.name, err.message())),
            error_code: Some(err.code()),
        }
    }

    fn export_only(spec: &BackendSpec, message: &str) -> Self {
        let err = PkgError::export_only(message);
        Self {
            packages: Vec::new(),
            kind: BackendKind::ExportOnly,
            backend: Some(spec.name),
            message: Some(err.message().to_string()),
            error_code: Some(err.code()),
        }
    }

    fn not_found() -> Self {
        let err = PkgError::unavailable(NOT_FOUND_MESSAGE);
        Self {
            packages: Vec::new(),
            kind: BackendKind::Unknown,
            backend: None,
            message: Some(err.message().to_string()),
            error_code: Some(err.code()),
        }
    }

    /// Whether a backend actually listed packages.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.error_code.is_none()
    }
}

/// Availability of one table row, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BackendProbe {
    pub name: &'static str,
    pub kind: BackendKind,
    pub executable: Option<PathBuf>,
    pub scriptable: bool,
}

/// Walks the decision table against a [`Toolchain`].
pub struct BackendResolver<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
    table: &'a [BackendSpec],
    timeout: Duration,
}

impl<'a, T: Toolchain + ?Sized> BackendResolver<'a, T> {
    /// Resolver over the built-in [`BACKENDS`] table.
    #[must_use]
    pub fn new(toolchain: &'a T, timeout: Duration) -> Self {
        Self::with_table(toolchain, BACKENDS, timeout)
    }

    #[must_use]
    pub fn with_table(toolchain: &'a T, table: &'a [BackendSpec], timeout: Duration) -> Self {
        Self {
            toolchain,
            table,
            timeout,
        }
    }

    fn locate(&self, spec: &BackendSpec) -> Option<PathBuf> {
        spec.probe.iter().find_map(|p| self.toolchain.locate(p))
    }

    /// Report which rows of the table have their tool available.
    #[must_use]
    pub fn probe_all(&self) -> Vec<BackendProbe> {
        self.table
            .iter()
            .map(|spec| BackendProbe {
                name: spec.name,
                kind: spec.kind,
                executable: self.locate(spec),
                scriptable: matches!(spec.action, BackendAction::List { .. }),
            })
            .collect()
    }

    /// Obtain the installed package list from the highest-priority available backend.
    #[must_use]
    pub fn resolve(&self) -> Resolution {
        for spec in self.table {
            let Some(executable) = self.locate(spec) else {
                tracing::debug!(backend = spec.name, "backend not found");
                continue;
            };
            tracing::debug!(backend = spec.name, path = %executable.display(), "backend found");

            return match spec.action {
                BackendAction::List { args, normalize } => {
                    match self.list(&executable, args, normalize) {
                        Ok(packages) => {
                            tracing::info!(
                                backend = spec.name,
                                count = packages.len(),
                                "listed installed packages"
                            );
                            Resolution::listed(spec, packages)
                        }
                        Err(err) => {
                            tracing::warn!(
                                backend = spec.name,
                                code = err.code(),
                                "{}",
                                err.message()
                            );
                            Resolution::failed(spec, &err)
                        }
                    }
                }
                BackendAction::Guidance { message } => {
                    tracing::warn!(backend = spec.name, "backend is export-only");
                    Resolution::export_only(spec, message)
                }
            };
        }

        tracing::warn!("{NOT_FOUND_MESSAGE}");
        Resolution::not_found()
    }

    fn list(
        &self,
        executable: &std::path::Path,
        args: &[&str],
        normalize: Normalizer,
    ) -> Result<Vec<PackageRef>, PkgError> {
        let output = self.toolchain.run(executable, args, self.timeout)?;
        if !output.success() {
            let status = output
                .exit_code
                .map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"));
            let tail = output.stderr_tail(STDERR_TAIL_LINES);
            let detail = if tail.is_empty() {
                String::new()
            } else {
                format!(": {tail}")
            };
            return Err(PkgError::exit_failure(format!(
                "{} terminated with {status}{detail}",
                executable.display()
            )));
        }
        normalize(&output.stdout)
    }
}
