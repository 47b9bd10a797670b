//! Size classification and the two renderings of a summary.
//!
//! [`aggregate`] computes a [`Summary`] once; [`Summary::render_console`] and
//! [`Summary::export_records`] are alternate views of that same value.

use super::spec::PackageRef;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Width of the separator line in the console report.
pub const SEPARATOR_WIDTH: usize = 50;

/// Measured (or unmeasurable) size of one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub name: String,
    pub version: Option<String>,
    /// Megabytes, `None` when no artifact matched or it could not be read.
    pub size_mb: Option<f64>,
}

impl SizeRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, version: Option<String>, size_mb: Option<f64>) -> Self {
        Self {
            name: name.into(),
            version,
            size_mb: size_mb.filter(|s| s.is_finite() && *s >= 0.0),
        }
    }

    /// Record for a package reference with a known or unknown size.
    #[must_use]
    pub fn for_ref(pkg: &PackageRef, size_mb: Option<f64>) -> Self {
        Self::new(pkg.name(), pkg.version().map(str::to_string), size_mb)
    }
}

/// A package at or above the size threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargePackage {
    pub name: String,
    pub size_mb: f64,
}

/// Classified totals over a run's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub threshold_mb: f64,
    /// Sum of every measured size, large and small.
    pub total_mb: f64,
    /// Largest first; equal sizes keep input order.
    pub large: Vec<LargePackage>,
    /// Measured packages below the threshold.
    pub small_count: usize,
    pub small_total_mb: f64,
    /// Packages whose size could not be determined.
    pub unmeasured_count: usize,
    /// Every input record, in input order.
    pub records: Vec<SizeRecord>,
}

/// Classify `records` against `threshold_mb`.
#[must_use]
pub fn aggregate(records: Vec<SizeRecord>, threshold_mb: f64) -> Summary {
    let mut total_mb = 0.0;
    let mut large = Vec::new();
    let mut small_count = 0;
    let mut small_total_mb = 0.0;
    let mut unmeasured_count = 0;

    for record in &records {
        let Some(size) = record.size_mb else {
            unmeasured_count += 1;
            continue;
        };
        total_mb += size;
        if size >= threshold_mb {
            large.push(LargePackage {
                name: record.name.clone(),
                size_mb: size,
            });
        } else {
            small_count += 1;
            small_total_mb += size;
        }
    }

    // `sort_by` is stable, so ties stay in input order.
    large.sort_by(|a, b| b.size_mb.total_cmp(&a.size_mb));

    Summary {
        threshold_mb,
        total_mb,
        large,
        small_count,
        small_total_mb,
        unmeasured_count,
        records,
    }
}

/// One element of the exported JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    pub version: Option<String>,
    #[serde(rename = "size_MB")]
    pub size_mb: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Summary {
    /// The human-readable report, one line per `\n`.
    #[must_use]
    pub fn render_console(&self) -> String {
        let t = self.threshold_mb;
        let mut out = String::new();
        let _ = writeln!(out, "Total size of all packages: {:.2} MB", self.total_mb);
        let _ = writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH));
        let _ = writeln!(out, "Packages larger than {t} MB:");
        for pkg in &self.large {
            let _ = writeln!(out, "{}: {:.2} MB", pkg.name, pkg.size_mb);
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Packages smaller than {t} MB: {} packages",
            self.small_count
        );
        let _ = writeln!(
            out,
            "Combined size of packages smaller than {t} MB: {:.2} MB",
            self.small_total_mb
        );
        if self.unmeasured_count > 0 {
            let _ = writeln!(
                out,
                "Packages without a measurable size: {}",
                self.unmeasured_count
            );
        }
        out
    }

    /// Export view: one element per record, sizes rounded to 2 decimals.
    #[must_use]
    pub fn export_records(&self) -> Vec<ExportRecord> {
        self.records
            .iter()
            .map(|r| ExportRecord {
                name: r.name.clone(),
                version: r.version.clone(),
                size_mb: r.size_mb.map(round2),
            })
            .collect()
    }

    /// Export view as 2-space indented JSON.
    pub fn to_export_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.export_records())?)
    }
}

/// Write the export JSON for `summary` to `path`, creating parent directories.
pub fn write_export(summary: &Summary, path: &Path) -> Result<(), Error> {
    let json = summary.to_export_json()?;
    depsize_util::fs::write_creating_parents(path, json.as_bytes()).map_err(|source| {
        Error::ExportWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::debug!(path = %path.display(), records = summary.records.len(), "wrote export");
    Ok(())
}
