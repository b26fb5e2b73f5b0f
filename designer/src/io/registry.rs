//! Rendered network storage and the shared manifest.
//!
//! [`ArtifactStore`] writes one document per network; [`IndexStore`] owns the
//! manifest that lists them. [`FsRegistry`] implements both on the filesystem
//! and serializes manifest updates through a lock file so concurrent
//! registrations cannot overwrite each other.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use super::config::DesignerConfig;
use super::init::{DesignerPaths, EMPTY_MANIFEST};
use crate::core::extract::network_from_document;
use crate::network::Network;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

static QUOTED_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("quoted key pattern should be valid")
});

static ENTRY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[:=]\s*(?:true|false)\b").expect("entry value pattern should be valid")
});

/// Whether `append_if_absent` changed the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Added,
    AlreadyPresent,
}

/// Persistence for rendered network documents.
pub trait ArtifactStore {
    /// File name the document for `name` is stored under.
    fn artifact_file(&self, name: &str) -> String;

    /// Store `document` for `name`, replacing any previous version.
    fn write(&self, name: &str, document: &str) -> Result<PathBuf>;

    /// The stored document for `name`.
    fn read_document(&self, name: &str) -> Result<String>;
}

/// The shared manifest of known artifacts.
pub trait IndexStore {
    fn read(&self) -> Result<String>;

    /// Add a `"<key>": true` entry unless `key` is already listed.
    fn append_if_absent(&self, key: &str) -> Result<Registered>;
}

/// Result of a successful `publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub document_path: PathBuf,
    pub artifact_file: String,
    pub registered: Registered,
}

/// Register the artifact for `name` in the manifest. Idempotent.
pub fn register<S: ArtifactStore + IndexStore>(store: &S, name: &str) -> Result<Registered> {
    store.append_if_absent(&store.artifact_file(name))
}

/// Write the document, then register it. Registration never runs when the
/// write fails; a failed registration after a successful write is reported as
/// such and can be retried with `register`.
pub fn publish<S: ArtifactStore + IndexStore>(
    store: &S,
    name: &str,
    document: &str,
) -> Result<PublishOutcome> {
    let document_path = store
        .write(name, document)
        .with_context(|| format!("write network document for '{name}'"))?;
    let registered = register(store, name).with_context(|| {
        format!(
            "document written to {} but manifest was not updated; re-run to retry registration",
            document_path.display()
        )
    })?;
    Ok(PublishOutcome {
        document_path,
        artifact_file: store.artifact_file(name),
        registered,
    })
}

/// Read the stored document for `name` back into a network definition.
pub fn load_from_registry<S: ArtifactStore>(store: &S, name: &str) -> Result<Network> {
    let document = store.read_document(name)?;
    let network = network_from_document(&document).with_context(|| {
        format!(
            "read agent network '{name}' from {}",
            store.artifact_file(name)
        )
    })?;
    debug!(name, agents = network.node_count(), "network loaded from registry");
    Ok(network)
}

/// Keys of every `"key": true|false` entry in a manifest. Comments, and
/// strings that are values rather than keys, never count.
pub fn manifest_keys(contents: &str) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for line in contents.lines() {
        let line = strip_comment(line);
        for quoted in QUOTED_KEY_RE.find_iter(line) {
            if !ENTRY_VALUE_RE.is_match(&line[quoted.end()..]) {
                continue;
            }
            match serde_json::from_str::<String>(quoted.as_str()) {
                Ok(key) => {
                    keys.insert(key);
                }
                Err(err) => debug!(entry = quoted.as_str(), %err, "skipping unreadable manifest key"),
            }
        }
    }
    keys
}

/// `line` up to its first `#` or `//` comment outside a quoted string.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    for (i, &byte) in bytes.iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'#' => return &line[..i],
            b'/' if bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Insert `"<key>": true,` on its own line before the manifest's final `}`.
/// The key is quoted with JSON escaping, which HOCON quoted strings share.
pub fn insert_manifest_entry(contents: &str, key: &str) -> Result<String> {
    let close = contents
        .rfind('}')
        .ok_or_else(|| anyhow!("manifest has no closing '}}'"))?;
    let quoted = serde_json::to_string(key).context("quote manifest key")?;
    let head = contents[..close].trim_end_matches([' ', '\t']);
    let mut updated = String::with_capacity(contents.len() + quoted.len() + 16);
    updated.push_str(head);
    if !head.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&format!("    {quoted}: true,\n"));
    updated.push_str(&contents[close..]);
    Ok(updated)
}

/// Filesystem registry rooted at the configured output directory.
#[derive(Debug, Clone)]
pub struct FsRegistry {
    paths: DesignerPaths,
    lock_timeout: Duration,
}

impl FsRegistry {
    pub fn new(paths: DesignerPaths, lock_timeout: Duration) -> Self {
        Self {
            paths,
            lock_timeout,
        }
    }

    pub fn from_config(root: &Path, config: &DesignerConfig) -> Self {
        Self::new(DesignerPaths::new(root, config), config.io_timeout())
    }

    pub fn paths(&self) -> &DesignerPaths {
        &self.paths
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .paths
            .manifest_path
            .file_name()
            .unwrap_or_default()
            .to_os_string();
        name.push(".lock");
        self.paths.manifest_path.with_file_name(name)
    }
}

impl ArtifactStore for FsRegistry {
    fn artifact_file(&self, name: &str) -> String {
        self.paths.artifact_file(name)
    }

    #[instrument(skip_all, fields(name = %name))]
    fn write(&self, name: &str, document: &str) -> Result<PathBuf> {
        let path = self.paths.artifact_path(name);
        super::write_atomic(&path, document)?;
        info!(path = %path.display(), bytes = document.len(), "network document written");
        Ok(path)
    }

    fn read_document(&self, name: &str) -> Result<String> {
        let path = self.paths.artifact_path(name);
        fs::read_to_string(&path)
            .with_context(|| format!("read network document {}", path.display()))
    }
}

impl IndexStore for FsRegistry {
    fn read(&self) -> Result<String> {
        let path = &self.paths.manifest_path;
        fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))
    }

    #[instrument(skip_all, fields(key = %key))]
    fn append_if_absent(&self, key: &str) -> Result<Registered> {
        let manifest_path = &self.paths.manifest_path;
        if let Some(parent) = manifest_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let _lock = ManifestLock::acquire(&self.lock_path(), self.lock_timeout)?;

        let contents = if manifest_path.exists() {
            self.read()?
        } else {
            debug!(path = %manifest_path.display(), "manifest missing, creating");
            EMPTY_MANIFEST.to_string()
        };

        if manifest_keys(&contents).contains(key) {
            debug!(key, "manifest entry already present");
            return Ok(Registered::AlreadyPresent);
        }

        let updated = insert_manifest_entry(&contents, key)
            .with_context(|| format!("update manifest {}", manifest_path.display()))?;
        super::write_atomic(manifest_path, &updated)?;
        info!(key, path = %manifest_path.display(), "manifest entry added");
        Ok(Registered::Added)
    }
}

/// Exclusive lock held as a file created with `create_new`; removed on drop.
#[derive(Debug)]
struct ManifestLock {
    path: PathBuf,
}

impl ManifestLock {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        bail!(
                            "timed out after {:?} waiting for manifest lock {} (remove it if no other designer is running)",
                            timeout,
                            path.display()
                        );
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("create manifest lock {}", path.display()));
                }
            }
        }
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), err = %err, "failed to release manifest lock");
        }
    }
}
