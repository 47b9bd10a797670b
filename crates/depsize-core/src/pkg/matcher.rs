//! Resolving package names to installed artifacts.
//!
//! # Matching rules
//!
//! Names and directory entries are compared after [`normalize_name`]. An
//! entry is a candidate when its normalized name starts with the normalized
//! package name and, in [`MatchMode::Boundary`], the remainder is empty,
//! starts with `.` (`foo.py`, `foo.pth`) or is `-` followed by a digit
//! (`foo-1.2.3.dist-info`). [`MatchMode::Prefix`] accepts any remainder.
//!
//! Roots are searched in index order and the first root with any candidate
//! wins. Within that root candidates are ordered by (normalized name, path)
//! and the first is taken, so the bare package directory `foo` is preferred
//! over `foo-1.2.3.dist-info`. The order is bytewise and `-` sorts before
//! `.`, so when no bare directory exists a single-module package such as
//! `six` resolves to `six-1.16.0.dist-info`, not `six.py`.

use super::spec::normalize_name;
use crate::paths::PackageRootIndex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How strictly a directory entry must match a package name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The name must be followed by nothing, `.`, or `-<digit>`.
    #[default]
    Boundary,
    /// Any entry starting with the name matches (`request` matches `requests`).
    Prefix,
}

impl MatchMode {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boundary" => Some(Self::Boundary),
            "prefix" => Some(Self::Prefix),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::Prefix => "prefix",
        }
    }
}

/// Whether an installed artifact is a directory tree or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Directory,
    File,
}

/// An on-disk location believed to hold a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Whether `entry` (normalized) is a candidate for `target` (normalized).
#[must_use]
pub fn entry_matches(entry: &str, target: &str, mode: MatchMode) -> bool {
    let Some(rest) = entry.strip_prefix(target) else {
        return false;
    };
    match mode {
        MatchMode::Prefix => true,
        MatchMode::Boundary => {
            rest.is_empty()
                || rest.starts_with('.')
                || rest
                    .strip_prefix('-')
                    .is_some_and(|r| r.starts_with(|c: char| c.is_ascii_digit()))
        }
    }
}

/// All candidates for `target` directly inside `root`, in selection order.
///
/// An unreadable root yields no candidates.
#[must_use]
pub fn candidates_in_root(target: &str, root: &Path, mode: MatchMode) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(root = %root.display(), error = %err, "cannot read package root");
            return Vec::new();
        }
    };

    let mut matches: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let normalized = normalize_name(&entry.file_name().to_string_lossy());
            entry_matches(&normalized, target, mode).then(|| (normalized, entry.path()))
        })
        .collect();

    matches.sort();
    matches.into_iter().map(|(_, path)| path).collect()
}

/// Find the installed artifact for package `name`.
///
/// Returns `None` when no root holds a candidate; callers treat that as
/// "size unknown".
#[must_use]
pub fn find_artifact(name: &str, index: &PackageRootIndex, mode: MatchMode) -> Option<Artifact> {
    let target = normalize_name(name);
    if target.is_empty() {
        return None;
    }

    for root in index.paths() {
        let Some(path) = candidates_in_root(&target, root, mode).into_iter().next() else {
            continue;
        };
        let kind = if path.is_dir() {
            ArtifactKind::Directory
        } else {
            ArtifactKind::File
        };
        tracing::debug!(package = name, path = %path.display(), "matched artifact");
        return Some(Artifact { path, kind });
    }

    tracing::debug!(package = name, "no installed artifact matched");
    None
}
