#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod doctor;
pub mod error;
pub mod paths;
pub mod pkg;
pub mod version;

pub use config::Config;
pub use error::Error;
pub use paths::{PackageRoot, PackageRootIndex, RootSource};
pub use pkg::{
    aggregate, find_artifact, measure, read_manifest_names, run_pipeline, select_packages,
    Artifact, BackendKind, BackendResolver, MatchMode, PackageRef, PkgError, Resolution,
    SizeRecord, SizeRun, Summary, SystemToolchain, Toolchain,
};
pub use version::VERSION;
