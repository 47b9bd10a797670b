//! Package size resolution.
//!
//! Provides utilities for:
//! - Normalizing package names and references
//! - Listing installed packages through the first available package manager
//! - Matching names to installed artifacts under the package roots
//! - Measuring artifacts, in parallel, preserving input order
//! - Classifying sizes and rendering console or JSON reports
//! - Extracting dependency names from manifests
//! - Scanning package roots without a backend

pub mod backend;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod measure;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod scan;
pub mod spec;

pub use backend::{
    normalize_pip_json, BackendAction, BackendKind, BackendProbe, BackendResolver, BackendSpec,
    Resolution, BACKENDS, NOT_FOUND_MESSAGE,
};
pub use error::{codes as pkg_codes, PkgError};
pub use manifest::{read_manifest_names, requirement_name};
pub use matcher::{find_artifact, Artifact, ArtifactKind, MatchMode};
pub use measure::{measure, measure_path, select_packages, MeasureOptions};
pub use pipeline::{run_pipeline, SizeRun};
pub use process::{ProcessOutput, SystemToolchain, Toolchain};
pub use report::{aggregate, write_export, ExportRecord, LargePackage, SizeRecord, Summary};
pub use scan::{retain_named, scan_roots};
pub use spec::{normalize_name, PackageRef};
