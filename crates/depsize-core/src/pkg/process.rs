//! Locating and running package-manager executables.
//!
//! Everything that touches `PATH` or spawns a process goes through the
//! [`Toolchain`] trait so the backend table can be exercised without real
//! executables.

use super::error::PkgError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last few non-empty stderr lines, for diagnostics.
    #[must_use]
    pub fn stderr_tail(&self, lines: usize) -> String {
        let tail: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = tail.len().saturating_sub(lines);
        tail[start..].join("\n")
    }
}

/// Executable lookup and invocation.
pub trait Toolchain: Sync {
    /// Find `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` with `args` (no shell), capturing stdout and stderr as text.
    ///
    /// Implementations must give up after `timeout` and report
    /// [`codes::BACKEND_TIMEOUT`](super::error::codes::BACKEND_TIMEOUT).
    fn run(&self, program: &Path, args: &[&str], timeout: Duration)
        -> Result<ProcessOutput, PkgError>;
}

/// The real system: `which` for lookup, tokio for bounded execution.
#[derive(Debug, Clone, Default)]
pub struct SystemToolchain {
    search_path: Option<OsString>,
    cwd: Option<PathBuf>,
}

impl SystemToolchain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look executables up in `path` instead of `$PATH`.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Run children in `cwd` (so project-local environments are picked up).
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Toolchain for SystemToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let found = match (&self.search_path, &self.cwd) {
            (Some(paths), Some(cwd)) => which::which_in(program, Some(paths), cwd),
            (Some(paths), None) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(program, Some(paths), cwd)
            }
            (None, _) => which::which(program),
        };
        found.ok()
    }

    fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, PkgError> {
        let display = program.display().to_string();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PkgError::spawn_failed(&display, &e))?;

        runtime.block_on(async {
            let mut cmd = tokio::process::Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(cwd) = &self.cwd {
                cmd.current_dir(cwd);
            }
            if let Some(paths) = &self.search_path {
                cmd.env("PATH", paths);
            }

            let child = cmd
                .spawn()
                .map_err(|e| PkgError::spawn_failed(&display, &e))?;

            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(ProcessOutput {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }),
                Ok(Err(e)) => Err(PkgError::spawn_failed(&display, &e)),
                Err(_) => Err(PkgError::timeout(&display, timeout.as_secs_f64())),
            }
        })
    }
}
