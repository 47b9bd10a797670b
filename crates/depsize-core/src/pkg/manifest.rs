//! Dependency names declared in a project manifest.
//!
//! Supports `pyproject.toml` (PEP 621, PEP 735 groups, Poetry), `setup.cfg`
//! and requirements-style text. Only names are extracted: extras, pins,
//! environment markers and URLs are dropped and the result is lowercased.

use crate::error::Error;
use std::collections::BTreeSet;
use std::path::Path;
use toml::Value as TomlValue;

/// Read `path` and extract the declared dependency names.
pub fn read_manifest_names(path: &Path) -> Result<BTreeSet<String>, Error> {
    let raw = depsize_util::fs::read_to_string_lossy(path).map_err(|source| Error::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let names = if file_name.ends_with(".toml") {
        parse_pyproject(&raw).map_err(|message| Error::ManifestParse {
            path: path.to_path_buf(),
            message,
        })?
    } else if file_name.ends_with(".cfg") {
        parse_setup_cfg(&raw)
    } else {
        parse_requirements(&raw)
    };

    tracing::debug!(path = %path.display(), names = names.len(), "read manifest");
    Ok(names)
}

/// The distribution name at the start of a PEP 508 requirement, lowercased.
///
/// Returns `None` for lines that do not start with a name.
#[must_use]
pub fn requirement_name(requirement: &str) -> Option<String> {
    let name: String = requirement
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let name = name.trim_end_matches(['.', '-', '_']);
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

/// Names from requirements-file text.
///
/// Blank lines, comments, indented continuation lines (hashes, `# via`) and
/// option lines such as `-r other.txt` or `--index-url` are skipped.
#[must_use]
pub fn parse_requirements(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter(|line| !line.starts_with([' ', '\t']))
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(requirement_name)
        .collect()
}

fn string_items(value: Option<&TomlValue>) -> impl Iterator<Item = &str> {
    value
        .and_then(TomlValue::as_array)
        .into_iter()
        .flatten()
        .filter_map(TomlValue::as_str)
}

/// Names from a `pyproject.toml` document.
pub fn parse_pyproject(text: &str) -> Result<BTreeSet<String>, String> {
    let document: TomlValue = toml::from_str(text).map_err(|e| e.to_string())?;
    let mut names = BTreeSet::new();

    if let Some(project) = document.get("project") {
        names.extend(string_items(project.get("dependencies")).filter_map(requirement_name));
        if let Some(optional) = project
            .get("optional-dependencies")
            .and_then(TomlValue::as_table)
        {
            for extra in optional.values() {
                names.extend(string_items(Some(extra)).filter_map(requirement_name));
            }
        }
    }

    // Include-group tables inside a group are not strings and are skipped.
    if let Some(groups) = document.get("dependency-groups").and_then(TomlValue::as_table) {
        for group in groups.values() {
            names.extend(string_items(Some(group)).filter_map(requirement_name));
        }
    }

    if let Some(poetry) = document.get("tool").and_then(|t| t.get("poetry")) {
        let mut tables = vec![poetry.get("dependencies"), poetry.get("dev-dependencies")];
        if let Some(groups) = poetry.get("group").and_then(TomlValue::as_table) {
            tables.extend(groups.values().map(|g| g.get("dependencies")));
        }
        for table in tables.into_iter().flatten().filter_map(TomlValue::as_table) {
            names.extend(
                table
                    .keys()
                    .filter(|k| !k.eq_ignore_ascii_case("python"))
                    .filter_map(|k| requirement_name(k)),
            );
        }
    }

    Ok(names)
}

/// Names from the `install_requires` key of a `setup.cfg` `[options]` section.
#[must_use]
pub fn parse_setup_cfg(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut in_options = false;
    let mut in_requires = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_options = trimmed.eq_ignore_ascii_case("[options]");
            in_requires = false;
            continue;
        }
        if !in_options || trimmed.starts_with(['#', ';']) {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            if in_requires {
                names.extend(requirement_name(trimmed));
            }
            continue;
        }

        in_requires = false;
        if let Some((key, value)) = trimmed.split_once('=') {
            if key.trim().eq_ignore_ascii_case("install_requires") {
                in_requires = true;
                names.extend(value.split(';').next().and_then(requirement_name));
            }
        }
    }

    names
}
