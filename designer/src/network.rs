//! In-memory agent network: named agents with ordered down-chains.
//!
//! Definition order is preserved. Rendering relies on it, so the network keeps
//! an ordered name list next to the lookup map instead of a plain `HashMap`.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub down_chains: Vec<String>,
}

impl Agent {
    pub fn new(instructions: impl Into<String>, down_chains: &[&str]) -> Self {
        Self {
            instructions: instructions.into(),
            down_chains: down_chains.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.down_chains.is_empty()
    }
}

/// Agent network keyed by agent name, in definition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Network {
    names: Vec<String>,
    agents: HashMap<String, Agent>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an agent. A replaced agent keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, agent: Agent) {
        let name = name.into();
        if !self.agents.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.agents.insert(name, agent);
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.get_mut(name)
    }

    /// Agents in definition order.
    pub fn agents(&self) -> impl Iterator<Item = (&str, &Agent)> {
        self.names
            .iter()
            .filter_map(|name| self.agents.get(name).map(|agent| (name.as_str(), agent)))
    }

    /// Agent names in definition order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Declared down-chains of `name`; empty for unknown agents.
    pub fn down_chains(&self, name: &str) -> &[String] {
        self.agents
            .get(name)
            .map(|agent| agent.down_chains.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Build a network from a JSON object, keeping key order.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| anyhow!("agent network definition must be a JSON object"))?;
        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut network = Self::new();
        for (name, raw) in map {
            let agent: Agent = serde_json::from_value(raw.clone())
                .with_context(|| format!("parse agent '{name}'"))?;
            network.insert(name.clone(), agent);
        }
        Ok(network)
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.agents())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Network::from_map(&map).map_err(|err| D::Error::custom(format!("{err:#}")))
    }
}
