use super::{load_filter, package_roots, report_resolution, toolchain};
use depsize_core::pkg::{aggregate, retain_named, run_pipeline, scan_roots, Summary};
use depsize_core::Config;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

/// Run the total command.
///
/// Prints the size report to stdout, or the summary as one JSON object when
/// `json` is set. With `scan`, every entry under the package roots is
/// measured and no package manager is consulted.
pub fn run(config: &Config, from: Option<&Path>, scan: bool, json: bool) -> Result<()> {
    let toolchain = toolchain(config);
    let filter = load_filter(config, from)?;
    let index = package_roots(config, &toolchain);

    let summary: Summary = if scan {
        let mut records = scan_roots(&index, config.jobs);
        if let Some(names) = &filter {
            retain_named(&mut records, names);
        }
        aggregate(records, config.large_threshold_mb)
    } else {
        let run = run_pipeline(config, &toolchain, &index, filter.as_ref());
        report_resolution(&run.resolution);
        run.summary
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
    } else {
        print!("{}", summary.render_console());
    }
    Ok(())
}
