//! Test-only helpers for building networks and scripted stores.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::io::config::DesignerConfig;
use crate::io::definition::write_definition;
use crate::io::init::{DesignerPaths, InitOptions, init_designer};
use crate::io::registry::{ArtifactStore, IndexStore, Registered};
use crate::network::{Agent, Network};

/// Build a network from `(name, instructions, down_chains)` rows, in order.
pub fn network(agents: &[(&str, &str, &[&str])]) -> Network {
    let mut network = Network::new();
    for (name, instructions, down_chains) in agents {
        network.insert(*name, Agent::new(*instructions, down_chains));
    }
    network
}

/// Sorted owned name set, matching what topology queries return.
pub fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// In-memory registry that records writes and manifest keys.
#[derive(Debug, Default)]
pub struct ScriptedRegistry {
    /// Fail every `append_if_absent` call.
    pub fail_register: bool,
    pub written: Mutex<Vec<(String, String)>>,
    pub manifest: Mutex<Vec<String>>,
}

impl ScriptedRegistry {
    pub fn writes(&self) -> Vec<(String, String)> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.manifest.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl ArtifactStore for ScriptedRegistry {
    fn artifact_file(&self, name: &str) -> String {
        format!("{name}.hocon")
    }

    fn write(&self, name: &str, document: &str) -> Result<std::path::PathBuf> {
        self.written
            .lock()
            .map_err(|_| anyhow!("scripted registry poisoned"))?
            .push((name.to_string(), document.to_string()));
        Ok(Path::new("scripted").join(self.artifact_file(name)))
    }

    fn read_document(&self, name: &str) -> Result<String> {
        self.writes()
            .into_iter()
            .rev()
            .find(|(written, _)| written == name)
            .map(|(_, document)| document)
            .ok_or_else(|| anyhow!("no scripted document for '{name}'"))
    }
}

impl IndexStore for ScriptedRegistry {
    fn read(&self) -> Result<String> {
        Ok(self.keys().join("\n"))
    }

    fn append_if_absent(&self, key: &str) -> Result<Registered> {
        if self.fail_register {
            return Err(anyhow!("scripted manifest failure"));
        }
        let mut manifest = self
            .manifest
            .lock()
            .map_err(|_| anyhow!("scripted registry poisoned"))?;
        if manifest.iter().any(|existing| existing == key) {
            return Ok(Registered::AlreadyPresent);
        }
        manifest.push(key.to_string());
        Ok(Registered::Added)
    }
}

/// Temporary project directory with `designer init` already applied.
pub struct TestProject {
    temp: TempDir,
    pub config: DesignerConfig,
    pub paths: DesignerPaths,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let config = DesignerConfig::default();
        let paths = init_designer(temp.path(), &config, &InitOptions { force: false })?;
        Ok(Self {
            temp,
            config,
            paths,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write `network` as `<file>` under the project root and return its path.
    pub fn write_definition(&self, file: &str, network: &Network) -> Result<std::path::PathBuf> {
        let path = self.root().join(file);
        write_definition(&path, network)?;
        Ok(path)
    }
}
