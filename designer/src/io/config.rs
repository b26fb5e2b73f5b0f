//! Designer configuration stored in `designer.toml` at the project root.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::{DanglingPolicy, HeaderOptions, ValidationOptions};

/// Designer configuration (TOML).
///
/// Edited by humans; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DesignerConfig {
    /// Directory (relative to the project root) holding rendered networks.
    pub output_dir: String,

    /// Extension of rendered network files, without the dot.
    pub extension: String,

    /// Manifest file name inside `output_dir`.
    pub manifest_file: String,

    /// Longest wait for the manifest lock, in seconds.
    pub io_timeout_secs: u64,

    /// Whether unknown down-chain names are defects.
    pub dangling_references: DanglingPolicy,

    pub header: HeaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeaderConfig {
    pub model_name: String,
    pub aaosa_include: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        let header = HeaderOptions::default();
        Self {
            model_name: header.model_name,
            aaosa_include: header.aaosa_include,
        }
    }
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            output_dir: "registries".to_string(),
            extension: "hocon".to_string(),
            manifest_file: "manifest.hocon".to_string(),
            io_timeout_secs: 10,
            dangling_references: DanglingPolicy::default(),
            header: HeaderConfig::default(),
        }
    }
}

impl DesignerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.trim().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        if self.extension.trim().is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(anyhow!(
                "extension must be a bare extension like 'hocon' (got '{}')",
                self.extension
            ));
        }
        if self.manifest_file.trim().is_empty() || self.manifest_file.contains(['/', '\\']) {
            return Err(anyhow!(
                "manifest_file must be a file name (got '{}')",
                self.manifest_file
            ));
        }
        if self.io_timeout_secs == 0 {
            return Err(anyhow!("io_timeout_secs must be > 0"));
        }
        if self.header.model_name.trim().is_empty() {
            return Err(anyhow!("header.model_name must not be empty"));
        }
        Ok(())
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            dangling_references: self.dangling_references,
        }
    }

    pub fn header_options(&self) -> HeaderOptions {
        HeaderOptions {
            model_name: self.header.model_name.clone(),
            aaosa_include: self.header.aaosa_include.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DesignerConfig::default()`.
pub fn load_config(path: &Path) -> Result<DesignerConfig> {
    if !path.exists() {
        let cfg = DesignerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DesignerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DesignerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DesignerConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("designer.toml");
        let cfg = DesignerConfig {
            dangling_references: DanglingPolicy::Ignore,
            ..DesignerConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("designer.toml");
        fs::write(
            &path,
            "output_dir = \"out\"\ndangling_references = \"ignore\"\n\n[header]\nmodel_name = \"m\"\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.output_dir, "out");
        assert_eq!(cfg.extension, "hocon");
        assert_eq!(cfg.dangling_references, DanglingPolicy::Ignore);
        assert_eq!(cfg.header.model_name, "m");
        assert_eq!(cfg.header.aaosa_include, "registries/aaosa.hocon");
    }

    #[test]
    fn rejects_dotted_extension() {
        let cfg = DesignerConfig {
            extension: ".hocon".to_string(),
            ..DesignerConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("bare extension"));
    }
}
