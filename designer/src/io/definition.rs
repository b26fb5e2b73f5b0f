//! Network definition load/save helpers with schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::network::Network;

pub const DEFINITION_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/agent_network/v1.schema.json"
));

/// Load a network definition from disk and check its shape against the schema.
///
/// Structural invariants are not checked here; see `core::invariants`.
pub fn load_definition(path: &Path) -> Result<Network> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read definition {}", path.display()))?;
    let network = parse_definition(&contents)
        .with_context(|| format!("load definition {}", path.display()))?;
    debug!(path = %path.display(), agents = network.node_count(), "definition loaded");
    Ok(network)
}

/// Like `load_definition`, but a missing file yields an empty network.
pub fn load_definition_or_empty(path: &Path) -> Result<Network> {
    if !path.exists() {
        debug!(path = %path.display(), "definition missing, starting empty");
        return Ok(Network::new());
    }
    load_definition(path)
}

/// Parse a JSON definition string, preserving agent order.
pub fn parse_definition(contents: &str) -> Result<Network> {
    let value: Value = serde_json::from_str(contents).context("parse definition json")?;
    validate_schema(&value)?;
    Network::from_json_value(&value)
}

/// Write a definition as pretty JSON with a trailing newline (temp file + rename).
pub fn write_definition(path: &Path, network: &Network) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(network).context("serialize definition")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}

fn validate_schema(definition: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(DEFINITION_SCHEMA).context("parse definition schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(definition) {
        let messages = compiled
            .iter_errors(definition)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "definition schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::network;

    #[test]
    fn write_then_load_preserves_order_and_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("network.json");
        let net = network(&[
            ("leaf", "Answer.", &[]),
            ("top", "Route.", &["leaf"]),
        ]);

        write_definition(&path, &net).expect("write");
        let loaded = load_definition(&path).expect("load");
        assert_eq!(loaded, net);
        assert_eq!(loaded.names(), ["leaf", "top"]);
    }

    #[test]
    fn schema_rejects_non_string_down_chains() {
        let err = parse_definition(r#"{"top": {"down_chains": [1, 2]}}"#).unwrap_err();
        assert!(
            format!("{err:#}").contains("schema validation failed"),
            "{err:#}"
        );
    }

    #[test]
    fn schema_rejects_unknown_agent_fields() {
        let err = parse_definition(r#"{"top": {"downchains": ["a"]}}"#).unwrap_err();
        assert!(format!("{err:#}").contains("schema validation failed"));
    }

    #[test]
    fn missing_file_is_empty_network_only_when_requested() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("absent.json");
        assert!(load_definition_or_empty(&path).expect("empty").is_empty());
        assert!(load_definition(&path).is_err());
    }
}
