//! Package engine error types.

use std::fmt;
use std::io;

/// Stable error codes. These appear in logs and `--json` output.
pub mod codes {
    pub const PKG_NAME_EMPTY: &str = "PKG_NAME_EMPTY";
    pub const BACKEND_UNAVAILABLE: &str = "BACKEND_UNAVAILABLE";
    pub const BACKEND_EXPORT_ONLY: &str = "BACKEND_EXPORT_ONLY";
    pub const BACKEND_SPAWN_FAILED: &str = "BACKEND_SPAWN_FAILED";
    pub const BACKEND_EXIT_FAILURE: &str = "BACKEND_EXIT_FAILURE";
    pub const BACKEND_OUTPUT_MALFORMED: &str = "BACKEND_OUTPUT_MALFORMED";
    pub const BACKEND_TIMEOUT: &str = "BACKEND_TIMEOUT";
}

/// Package engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgError {
    code: &'static str,
    message: String,
}

impl PkgError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn name_empty() -> Self {
        Self::new(codes::PKG_NAME_EMPTY, "Package name must not be empty")
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(codes::BACKEND_UNAVAILABLE, msg)
    }

    pub fn export_only(msg: impl Into<String>) -> Self {
        Self::new(codes::BACKEND_EXPORT_ONLY, msg)
    }

    #[must_use]
    pub fn spawn_failed(program: &str, err: &io::Error) -> Self {
        Self::new(
            codes::BACKEND_SPAWN_FAILED,
            format!("Failed to run {program}: {err}"),
        )
    }

    pub fn exit_failure(msg: impl Into<String>) -> Self {
        Self::new(codes::BACKEND_EXIT_FAILURE, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(codes::BACKEND_OUTPUT_MALFORMED, msg)
    }

    #[must_use]
    pub fn timeout(program: &str, secs: f64) -> Self {
        Self::new(
            codes::BACKEND_TIMEOUT,
            format!("{program} did not finish within {secs:.1}s"),
        )
    }
}

impl fmt::Display for PkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PkgError {}

impl From<serde_json::Error> for PkgError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(format!("Error parsing JSON output: {e}"))
    }
}
