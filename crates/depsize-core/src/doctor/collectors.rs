//! Data collectors for the doctor report.

use super::{codes, OsInfo, RuntimeInfo, SettingsInfo, Warning};
use crate::config::Config;
use crate::paths::{PackageRoot, PackageRootIndex};
use crate::pkg::{BackendKind, BackendProbe, BackendResolver, MatchMode, Toolchain};
use crate::version::{SCHEMA_VERSION, VERSION};

/// Collect runtime information.
#[must_use]
pub fn collect_runtime() -> RuntimeInfo {
    RuntimeInfo {
        version: VERSION.to_string(),
        schema_version: SCHEMA_VERSION,
    }
}

#[must_use]
pub fn collect_os() -> OsInfo {
    OsInfo {
        name: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// Collect the effective configuration.
pub fn collect_settings(config: &Config, warnings: &mut Vec<Warning>) -> SettingsInfo {
    if config.match_mode == MatchMode::Prefix {
        warnings.push(Warning::info(
            codes::PREFIX_MATCHING,
            "Prefix matching is enabled; `request` will also match `requests`",
        ));
    }

    SettingsInfo {
        cwd: config.cwd.clone(),
        match_mode: config.match_mode.as_str().to_string(),
        backend_timeout_secs: config.backend_timeout.as_secs_f64(),
        large_threshold_mb: config.large_threshold_mb,
        jobs: config.jobs,
    }
}

/// Collect the package roots, warning when there are none.
pub fn collect_roots(index: &PackageRootIndex, warnings: &mut Vec<Warning>) -> Vec<PackageRoot> {
    if index.is_empty() {
        warnings.push(Warning::warn(
            codes::NO_PACKAGE_ROOTS,
            "No package roots found; pass --root or activate an environment",
        ));
    }
    index.roots().to_vec()
}

/// Probe every row of the backend table without running anything.
#[must_use]
pub fn collect_backends<T: Toolchain + ?Sized>(config: &Config, toolchain: &T) -> Vec<BackendProbe> {
    BackendResolver::new(toolchain, config.backend_timeout).probe_all()
}

/// The row the resolver would use: the first one with a located executable.
pub fn select_backend(backends: &[BackendProbe], warnings: &mut Vec<Warning>) -> Option<String> {
    let Some(selected) = backends.iter().find(|b| b.executable.is_some()) else {
        warnings.push(Warning::warn(
            codes::NO_BACKEND,
            crate::pkg::NOT_FOUND_MESSAGE,
        ));
        return None;
    };

    if selected.kind == BackendKind::ExportOnly {
        warnings.push(Warning::info(
            codes::EXPORT_ONLY_BACKEND,
            format!(
                "{} can only be measured from an exported requirements file (use --from)",
                selected.name
            ),
        ));
    }

    Some(selected.name.to_string())
}
