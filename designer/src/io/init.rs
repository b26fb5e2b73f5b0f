//! Project layout for rendered networks and `designer init` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{DesignerConfig, write_config};

pub const CONFIG_FILE: &str = "designer.toml";
pub const EMPTY_MANIFEST: &str = "{\n}\n";

/// Canonical paths for a project root and its configuration.
#[derive(Debug, Clone)]
pub struct DesignerPaths {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub extension: String,
}

impl DesignerPaths {
    pub fn new(root: impl Into<PathBuf>, config: &DesignerConfig) -> Self {
        let root = root.into();
        let output_dir = root.join(&config.output_dir);
        Self {
            root,
            manifest_path: output_dir.join(&config.manifest_file),
            output_dir,
            extension: config.extension.clone(),
        }
    }

    /// File name of the rendered network `name`, e.g. `support.hocon`.
    pub fn artifact_file(&self, name: &str) -> String {
        format!("{name}.{}", self.extension)
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(self.artifact_file(name))
    }
}

/// Default location of `designer.toml` for `root`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Options for `init_designer`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config and reset the manifest.
    pub force: bool,
}

/// Create `designer.toml`, the output directory and an empty manifest.
///
/// Fails if the config already exists unless `options.force` is set.
pub fn init_designer(
    root: &Path,
    config: &DesignerConfig,
    options: &InitOptions,
) -> Result<DesignerPaths> {
    let cfg_path = config_path(root);
    if cfg_path.exists() && !options.force {
        return Err(anyhow!(
            "designer init: {} already exists (use --force to overwrite)",
            cfg_path.display()
        ));
    }

    let paths = DesignerPaths::new(root, config);
    write_config(&cfg_path, config)?;
    fs::create_dir_all(&paths.output_dir)
        .with_context(|| format!("create directory {}", paths.output_dir.display()))?;
    if options.force || !paths.manifest_path.exists() {
        fs::write(&paths.manifest_path, EMPTY_MANIFEST)
            .with_context(|| format!("write manifest {}", paths.manifest_path.display()))?;
    }

    info!(root = %root.display(), "initialized designer layout");
    Ok(paths)
}
