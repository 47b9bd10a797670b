use crate::pkg::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on a single package-manager invocation.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Packages at or above this many megabytes are reported individually.
pub const DEFAULT_LARGE_THRESHOLD_MB: f64 = 1.0;

/// Runtime configuration for depsize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = WARN, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Explicit package roots. Empty means discover them.
    pub roots: Vec<PathBuf>,

    /// Upper bound for each backend subprocess.
    #[serde(with = "duration_secs")]
    pub backend_timeout: Duration,

    /// Size (MB) at which a package counts as large.
    pub large_threshold_mb: f64,

    /// How declared names are matched against installed entries.
    pub match_mode: MatchMode,

    /// Worker threads for sizing. `None` uses the rayon default.
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            roots: Vec::new(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            large_threshold_mb: DEFAULT_LARGE_THRESHOLD_MB,
            match_mode: MatchMode::default(),
            jobs: None,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Use these package roots instead of discovering them. Relative paths
    /// are taken relative to `cwd`.
    #[must_use]
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots
            .into_iter()
            .map(|r| if r.is_absolute() { r } else { self.cwd.join(r) })
            .collect();
        self
    }

    #[must_use]
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Set the large-package threshold. Negative or non-finite values are ignored.
    #[must_use]
    pub fn with_large_threshold_mb(mut self, threshold: f64) -> Self {
        if threshold.is_finite() && threshold >= 0.0 {
            self.large_threshold_mb = threshold;
        }
        self
    }

    #[must_use]
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Bound the sizing worker pool. Zero means "use the default".
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|&n| n > 0);
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
