use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive_assembly::ArchiveSummary;
use crate::cmake_integration::BuildConfig;
use crate::config::DeployConfig;

/// Machine-readable record of one packaging run, written next to the
/// archive for downstream tooling: which targets were built, for which
/// configurations, and the full ordered entry list of the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployManifest {
    pub framework: String,
    pub targets: Vec<String>,
    pub configurations: Vec<String>,
    pub archive: String,
    pub entries: Vec<String>,
}

pub fn build_manifest(config: &DeployConfig, summary: &ArchiveSummary) -> DeployManifest {
    DeployManifest {
        framework: config.framework_name.clone(),
        targets: config
            .modules
            .iter()
            .map(|m| m.target_name.clone())
            .collect(),
        configurations: [BuildConfig::Debug, BuildConfig::Release]
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
        archive: config.archive_name.clone(),
        entries: summary.entries.clone(),
    }
}

/// Manifest file next to the archive, named after it
/// (`Framework.zip` -> `Framework.manifest.json`).
pub fn manifest_path(config: &DeployConfig) -> PathBuf {
    let stem = Path::new(&config.archive_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&config.archive_name);

    config.project_root.join(format!("{}.manifest.json", stem))
}

pub fn write_manifest(manifest: &DeployManifest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .context("Failed to serialize manifest to JSON")?;

    fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;

    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<DeployManifest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest from {}", path.display()))?;

    let manifest = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse manifest JSON from {}", path.display()))?;

    Ok(manifest)
}
