pub mod doctor;
pub mod export;
pub mod total;
pub mod version;

use depsize_core::pkg::Resolution;
use depsize_core::{read_manifest_names, Config, PackageRootIndex, SystemToolchain};
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// The real toolchain, running children in the configured working directory.
pub fn toolchain(config: &Config) -> SystemToolchain {
    SystemToolchain::new().with_cwd(config.cwd.clone())
}

/// Resolve the package roots once for this run.
pub fn package_roots(config: &Config, toolchain: &SystemToolchain) -> PackageRootIndex {
    let index = PackageRootIndex::discover(config, toolchain);
    tracing::debug!(roots = index.len(), "resolved package roots");
    index
}

/// Read the `--from` manifest, if given.
///
/// A manifest that declares nothing is reported and treated as no filter.
pub fn load_filter(config: &Config, from: Option<&Path>) -> Result<Option<BTreeSet<String>>> {
    let Some(from) = from else {
        return Ok(None);
    };
    let path = config.cwd.join(from);
    let names = read_manifest_names(&path).into_diagnostic()?;
    if names.is_empty() {
        eprintln!(
            "No packages found in {}. Is the file empty or does it only contain comments?",
            from.display()
        );
        return Ok(None);
    }
    Ok(Some(names))
}

/// Tell the user why the package list is empty, when it is.
pub fn report_resolution(resolution: &Resolution) {
    if let Some(message) = &resolution.message {
        eprintln!("{message}");
    }
}
