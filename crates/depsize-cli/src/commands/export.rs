use super::{load_filter, package_roots, report_resolution, toolchain};
use depsize_core::pkg::{run_pipeline, write_export};
use depsize_core::Config;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

/// Run the export command: measure and write the JSON record list to `output`.
pub fn run(config: &Config, output: &Path, from: Option<&Path>) -> Result<()> {
    let toolchain = toolchain(config);
    let filter = load_filter(config, from)?;
    let index = package_roots(config, &toolchain);

    let run = run_pipeline(config, &toolchain, &index, filter.as_ref());
    report_resolution(&run.resolution);

    let path = config.cwd.join(output);
    write_export(&run.summary, &path).into_diagnostic()?;
    println!("Dependencies written to {}", output.display());
    Ok(())
}
