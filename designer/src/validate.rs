//! Validation entry points for `designer validate` and the create pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::invariants::{find_warnings, validate_network};
use crate::core::types::ValidationOptions;
use crate::io::definition::load_definition;
use crate::network::Network;

pub const NO_NETWORK: &str = "No network definition provided";
pub const NO_NETWORK_NAME: &str = "No agent network name provided";

/// Defects block rendering; warnings never do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub defects: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidateOutcome {
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }
}

/// Validate an in-memory network. An empty network is a single
/// missing-input defect rather than a structural report.
pub fn validate_definition(network: &Network, options: &ValidationOptions) -> ValidateOutcome {
    if network.is_empty() {
        return ValidateOutcome {
            defects: vec![NO_NETWORK.to_string()],
            warnings: Vec::new(),
        };
    }
    let outcome = ValidateOutcome {
        defects: validate_network(network, options),
        warnings: find_warnings(network),
    };
    debug!(
        agents = network.node_count(),
        defects = outcome.defects.len(),
        warnings = outcome.warnings.len(),
        "network validated"
    );
    outcome
}

/// Load a definition file and validate it.
pub fn validate_file(path: &Path, options: &ValidationOptions) -> Result<ValidateOutcome> {
    let network = load_definition(path).with_context(|| "load network definition")?;
    Ok(validate_definition(&network, options))
}

/// Missing-input defects for a network name used as an artifact base name.
pub fn validate_network_name(name: &str) -> Vec<String> {
    if name.trim().is_empty() {
        return vec![NO_NETWORK_NAME.to_string()];
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return vec![format!(
            "Agent network name must be a plain file name (got '{name}')"
        )];
    }
    Vec::new()
}
