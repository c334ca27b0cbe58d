//! Project resolution (spec.md §6.2): locate a project's `Cargo.toml` by
//! package name under a solution directory.
//!
//! Tries `cargo_metadata` first (fast, handles workspaces correctly,
//! grounded on the teacher's `dependencies.rs` use of
//! `MetadataCommand`), falling back to a raw directory walk plus minimal
//! TOML parsing for a solution directory that isn't itself a cargo
//! workspace (e.g. several independent crates checked out side by side).

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A resolved project: its package name and the path to its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    /// The package name as declared in `[package].name`
    pub name: String,
    /// Path to the project's `Cargo.toml`
    pub manifest_path: PathBuf,
    /// The project's root directory (the manifest's parent)
    pub root_dir: PathBuf,
}

/// Locate the project named `package_name` under `solution_dir`. The
/// first manifest whose `[package].name` matches exactly wins (spec
/// §6.2's "the first file whose name is exactly
/// `<test-project-name>.csproj`" translated to Cargo's manifest
/// convention).
pub fn resolve(solution_dir: &Path, package_name: &str) -> Result<ResolvedProject> {
    if let Some(project) = resolve_via_cargo_metadata(solution_dir, package_name) {
        return Ok(project);
    }
    resolve_via_walk(solution_dir, package_name)
        .ok_or_else(|| Error::ManifestNotFound(package_name.to_string(), solution_dir.to_path_buf()))
}

fn resolve_via_cargo_metadata(solution_dir: &Path, package_name: &str) -> Option<ResolvedProject> {
    let root_manifest = solution_dir.join("Cargo.toml");
    if !root_manifest.exists() {
        return None;
    }

    let metadata = cargo_metadata::MetadataCommand::new()
        .manifest_path(&root_manifest)
        .no_deps()
        .exec()
        .ok()?;

    metadata
        .packages
        .iter()
        .find(|pkg| pkg.name.as_str() == package_name)
        .map(|pkg| {
            let manifest_path = PathBuf::from(pkg.manifest_path.as_str());
            ResolvedProject {
                name: pkg.name.to_string(),
                root_dir: manifest_path.parent().unwrap_or(solution_dir).to_path_buf(),
                manifest_path,
            }
        })
}

fn resolve_via_walk(solution_dir: &Path, package_name: &str) -> Option<ResolvedProject> {
    let mut candidates: Vec<PathBuf> = walkdir::WalkDir::new(solution_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some("Cargo.toml"))
        .collect();
    candidates.sort();

    for manifest_path in candidates {
        let Ok(content) = std::fs::read_to_string(&manifest_path) else { continue };
        let Ok(value) = content.parse::<toml::Value>() else { continue };

        if let Some(name) = value.get("package").and_then(|p| p.get("name")).and_then(|n| n.as_str()) {
            if name == package_name {
                return Some(ResolvedProject {
                    name: name.to_string(),
                    root_dir: manifest_path.parent().unwrap_or(solution_dir).to_path_buf(),
                    manifest_path,
                });
            }
        }
    }
    None
}
