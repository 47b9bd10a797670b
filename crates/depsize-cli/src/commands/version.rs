use depsize_core::version::{version_string, SCHEMA_VERSION, VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    schema_version: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let info = VersionInfo {
            name: "depsize",
            version: VERSION,
            schema_version: SCHEMA_VERSION,
        };
        println!("{}", serde_json::to_string(&info).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
