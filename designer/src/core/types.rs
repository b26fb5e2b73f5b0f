//! Shared deterministic types for the designer core.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use serde::{Deserialize, Serialize};

/// How down-chain references to agents missing from the network are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Report every unknown down-chain name as a defect.
    #[default]
    Reject,
    /// Skip unknown names during traversal without reporting them.
    Ignore,
}

/// Knobs for `validate_network`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub dangling_references: DanglingPolicy,
}

/// Template an agent is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// The unique top agent.
    Top,
    /// Non-top agent with at least one down-chain.
    Regular,
    /// Agent without down-chains.
    Leaf,
}

/// Values interpolated into the fixed document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderOptions {
    /// Model configured under `llm_config.model_name`.
    pub model_name: String,
    /// Path of the substitution file pulled in with `include`.
    pub aaosa_include: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o".to_string(),
            aaosa_include: "registries/aaosa.hocon".to_string(),
        }
    }
}
