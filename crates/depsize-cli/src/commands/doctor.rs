use super::{package_roots, toolchain};
use depsize_core::doctor::{DoctorReport, Severity};
use depsize_core::Config;
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};

/// Run the doctor command.
///
/// When `json` is true, outputs a single JSON object to stdout.
/// Otherwise, outputs human-readable formatted text to stdout.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let toolchain = toolchain(config);
    let index = package_roots(config, &toolchain);
    let report = DoctorReport::collect(config, &toolchain, &index);

    if json {
        print_json(&report)?;
    } else {
        print_human(&report)?;
    }

    Ok(())
}

fn print_json(report: &DoctorReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn print_human(report: &DoctorReport) -> Result<()> {
    let mut out = io::stdout().lock();

    w(&mut out, "\x1b[1m## Runtime\x1b[0m\n")?;
    w(
        &mut out,
        &format!("  Version:        {}\n", report.runtime.version),
    )?;
    w(
        &mut out,
        &format!("  Schema:         v{}\n", report.runtime.schema_version),
    )?;
    w(
        &mut out,
        &format!("  OS:             {} ({})\n", report.os.name, report.os.arch),
    )?;
    w(&mut out, "\n")?;

    let settings = &report.settings;
    w(&mut out, "\x1b[1m## Settings\x1b[0m\n")?;
    w(
        &mut out,
        &format!("  CWD:            {}\n", settings.cwd.display()),
    )?;
    w(
        &mut out,
        &format!("  Match mode:     {}\n", settings.match_mode),
    )?;
    w(
        &mut out,
        &format!("  Timeout:        {}s\n", settings.backend_timeout_secs),
    )?;
    w(
        &mut out,
        &format!("  Threshold:      {} MB\n", settings.large_threshold_mb),
    )?;
    w(
        &mut out,
        &format!(
            "  Jobs:           {}\n",
            settings
                .jobs
                .map_or_else(|| "auto".to_string(), |j| j.to_string())
        ),
    )?;
    w(&mut out, "\n")?;

    w(&mut out, "\x1b[1m## Package roots\x1b[0m\n")?;
    if report.roots.is_empty() {
        w(&mut out, "  (none found)\n")?;
    }
    for root in &report.roots {
        w(
            &mut out,
            &format!("  {:<14}  {}\n", root.source.as_str(), root.path.display()),
        )?;
    }
    w(&mut out, "\n")?;

    w(&mut out, "\x1b[1m## Backends\x1b[0m\n")?;
    for backend in &report.backends {
        let mark = if backend.executable.is_some() {
            "\x1b[32m✓\x1b[0m"
        } else {
            "\x1b[31m✗\x1b[0m"
        };
        let location = backend
            .executable
            .as_ref()
            .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
        let selected = if report.selected_backend.as_deref() == Some(backend.name) {
            " (selected)"
        } else {
            ""
        };
        w(
            &mut out,
            &format!(
                "  {mark} {:<8} {:<12} {location}{selected}\n",
                backend.name,
                backend.kind.as_str()
            ),
        )?;
    }
    w(&mut out, "\n")?;

    if report.warnings.is_empty() {
        w(&mut out, "\x1b[1m## Warnings\x1b[0m\n")?;
        w(&mut out, "  \x1b[32mNo warnings\x1b[0m\n")?;
    } else {
        w(
            &mut out,
            &format!(
                "\x1b[1m## Warnings\x1b[0m ({} total)\n",
                report.warnings.len()
            ),
        )?;
        for warning in &report.warnings {
            let prefix = match warning.severity {
                Severity::Info => "\x1b[34minfo\x1b[0m",
                Severity::Warn => "\x1b[33mwarn\x1b[0m",
            };
            w(
                &mut out,
                &format!("  [{prefix}] {}: {}\n", warning.code, warning.message),
            )?;
        }
    }

    out.flush().into_diagnostic()?;
    Ok(())
}

fn w(out: &mut impl Write, s: &str) -> Result<()> {
    out.write_all(s.as_bytes()).into_diagnostic()
}
