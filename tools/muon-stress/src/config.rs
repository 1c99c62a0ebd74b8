//! Configuration defaults from workspace metadata.
//!
//! An optional `[workspace.metadata.muon]` table in the enclosing
//! workspace's `Cargo.toml` supplies the report directory and build label;
//! `MUON_REPORT_DIR` and `MUON_BUILD_LABEL` override it. A missing workspace
//! is the normal installed-tool case, not an error: the rig then reports
//! into the current directory under the crate version as label.

use serde::Deserialize;
use std::path::PathBuf;

/// Muon workspace metadata from Cargo.toml.
#[derive(Debug, Deserialize)]
struct MuonMetadata {
    /// Directory statistics files are written into, relative to the
    /// workspace root.
    #[serde(rename = "report-dir")]
    report_dir: Option<String>,
    /// Label recorded in the last field of every statistics line.
    #[serde(rename = "build-label")]
    build_label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceConfig {
    workspace: Option<WorkspaceSection>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceSection {
    metadata: Option<MetadataSection>,
}

#[derive(Debug, Deserialize)]
struct MetadataSection {
    muon: Option<MuonMetadata>,
}

/// Resolved rig configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory statistics files are written into.
    pub report_dir: PathBuf,
    /// Label recorded in the last field of every statistics line.
    pub build_label: String,
}

impl Config {
    /// Resolve configuration from workspace metadata and environment.
    ///
    /// Never fails: every layer has a fallback.
    pub fn load() -> Self {
        let meta = find_workspace_root().and_then(|root| {
            let content = std::fs::read_to_string(root.join("Cargo.toml")).ok()?;
            Some((root, parse_metadata(&content)?))
        });

        let report_dir = std::env::var_os("MUON_REPORT_DIR")
            .map(PathBuf::from)
            .or_else(|| {
                meta.as_ref().and_then(|(root, m)| {
                    m.report_dir.as_ref().map(|dir| root.join(dir))
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let build_label = std::env::var("MUON_BUILD_LABEL")
            .ok()
            .or_else(|| meta.as_ref().and_then(|(_, m)| m.build_label.clone()))
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Self {
            report_dir,
            build_label,
        }
    }
}

/// Extract the muon metadata table from a manifest, if present.
fn parse_metadata(content: &str) -> Option<MuonMetadata> {
    toml::from_str::<WorkspaceConfig>(content)
        .ok()?
        .workspace?
        .metadata?
        .muon
}

/// Find the workspace root by looking for a Cargo.toml with [workspace].
fn find_workspace_root() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let cargo_toml = dir.join("Cargo.toml");
        if cargo_toml.exists() {
            if let Ok(content) = std::fs::read_to_string(&cargo_toml) {
                if content.contains("[workspace]") {
                    return Some(dir);
                }
            }
        }
        if !dir.pop() {
            return None;
        }
    }
}
