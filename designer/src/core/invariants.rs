//! Structural invariants an agent network must satisfy before rendering.

use std::collections::BTreeSet;

use anyhow::{Result, bail};

use crate::core::topology::{
    find_cyclical_agents, find_dangling_references, find_duplicate_down_chains, find_top_agents,
    find_unreachable_agents,
};
use crate::core::types::{DanglingPolicy, ValidationOptions};
use crate::network::Network;

pub const NO_TOP_AGENT: &str = "No top agent found in network";

/// Check every structural and field invariant. Returns one message per defect;
/// an empty list means the network may be rendered.
///
/// - Exactly one top agent
/// - No cyclical down-chains
/// - Every agent reachable from the top agent (checked only with one top agent)
/// - No down-chain names outside the network (unless ignored by `options`)
/// - Every agent has instructions
pub fn validate_network(network: &Network, options: &ValidationOptions) -> Vec<String> {
    let mut errors = validate_structure(network, options);
    errors.extend(validate_instructions(network));
    errors
}

/// Topology-only checks; instructions are not inspected.
pub fn validate_structure(network: &Network, options: &ValidationOptions) -> Vec<String> {
    let mut errors = Vec::new();

    let top_agents = find_top_agents(network);
    if let Some(message) = top_agent_defect(&top_agents) {
        errors.push(message);
    }

    let cyclical = find_cyclical_agents(network);
    if !cyclical.is_empty() {
        errors.push(format!(
            "Cyclical dependencies found in agents: {}",
            name_list(&cyclical)
        ));
    }

    if let Some(top) = single(&top_agents) {
        let unreachable = find_unreachable_agents(network, top);
        if !unreachable.is_empty() {
            errors.push(format!(
                "Unreachable agents found: {}",
                name_list(&unreachable)
            ));
        }
    }

    if options.dangling_references == DanglingPolicy::Reject {
        let dangling = find_dangling_references(network);
        if !dangling.is_empty() {
            errors.push(format!(
                "Unknown down-chain agents referenced: {}",
                name_list(&dangling)
            ));
        }
    }

    errors
}

/// One message per agent, in definition order, whose instructions are empty.
pub fn validate_instructions(network: &Network) -> Vec<String> {
    network
        .agents()
        .filter(|(_, agent)| agent.instructions.is_empty())
        .map(|(name, _)| format!("{name} has no key: instructions"))
        .collect()
}

/// Quality findings that never block rendering.
pub fn find_warnings(network: &Network) -> Vec<String> {
    find_duplicate_down_chains(network)
        .into_iter()
        .map(|(agent, child)| format!("{agent} lists down-chain '{child}' more than once"))
        .collect()
}

/// The single top agent, or the same message `validate_network` reports.
pub fn top_agent(network: &Network) -> Result<&str> {
    let top_agents = find_top_agents(network);
    if let Some(message) = top_agent_defect(&top_agents) {
        bail!(message);
    }
    let name = single(&top_agents).unwrap_or_default();
    match network.agents().find(|(agent, _)| *agent == name) {
        Some((agent, _)) => Ok(agent),
        None => bail!(NO_TOP_AGENT),
    }
}

fn top_agent_defect(top_agents: &BTreeSet<String>) -> Option<String> {
    match top_agents.len() {
        0 => Some(NO_TOP_AGENT.to_string()),
        1 => None,
        _ => Some(format!(
            "Multiple top agents found: {}. Expected exactly one.",
            name_list(top_agents)
        )),
    }
}

fn single(names: &BTreeSet<String>) -> Option<&str> {
    match names.len() {
        1 => names.first().map(String::as_str),
        _ => None,
    }
}

/// Render sorted names as `["a", "b"]`.
fn name_list(names: &BTreeSet<String>) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("\"{name}\"")).collect();
    format!("[{}]", quoted.join(", "))
}
