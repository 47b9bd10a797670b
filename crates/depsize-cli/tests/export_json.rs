//! Integration tests for `depsize export`.

use std::fs;
use std::path::Path;
use std::process::Command;

fn depsize(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_depsize"));
    cmd.current_dir(cwd)
        .env("PATH", cwd)
        .env_remove("DEPSIZE_ROOTS")
        .env_remove("VIRTUAL_ENV")
        .env_remove("CONDA_PREFIX")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn unmatched_filter_name_exports_null_size() {
    let work = tempfile::tempdir().unwrap();
    let site = tempfile::tempdir().unwrap();
    fs::create_dir(site.path().join("foo")).unwrap();
    fs::write(work.path().join("requirements.txt"), "bar==1.0\n").unwrap();

    let output = depsize(work.path())
        .args([
            "export",
            "--output",
            "data/packages.json",
            "--from",
            "requirements.txt",
            "--root",
        ])
        .arg(site.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "Dependencies written to data/packages.json"
    );

    let text = fs::read_to_string(work.path().join("data").join("packages.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{"name": "bar", "version": null, "size_MB": null}])
    );
    assert!(text.contains("\n  {\n    \"name\": \"bar\""));
}

#[test]
fn filter_names_come_out_sorted_and_sized() {
    let work = tempfile::tempdir().unwrap();
    let site = tempfile::tempdir().unwrap();
    fs::create_dir(site.path().join("foo")).unwrap();
    fs::write(site.path().join("foo").join("data.bin"), vec![0u8; 1536 * 1024]).unwrap();
    fs::write(
        work.path().join("pyproject.toml"),
        "[project]\nname = \"app\"\ndependencies = [\"zeta\", \"foo>=1\"]\n",
    )
    .unwrap();

    let output = depsize(work.path())
        .args(["export", "-o", "out.json", "--from", "pyproject.toml", "--root"])
        .arg(site.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = fs::read_to_string(work.path().join("out.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "foo", "version": null, "size_MB": 1.5},
            {"name": "zeta", "version": null, "size_MB": null}
        ])
    );
}
