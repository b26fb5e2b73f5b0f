//! Editing operations used to build up a network definition step by step.

use anyhow::{Result, anyhow, bail};

use crate::network::{Agent, Network};

impl Network {
    /// Fresh network with one empty agent per name, in the given order.
    pub fn with_agents<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            bail!("No agent_names provided.");
        }
        let mut network = Self::new();
        for name in names {
            network.add_agent(name.as_ref())?;
        }
        Ok(network)
    }

    /// Add an empty agent. An existing agent of the same name is reset to
    /// empty but keeps its position.
    pub fn add_agent(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            bail!("No agent_name provided.");
        }
        self.insert(name, Agent::default());
        Ok(())
    }

    pub fn set_instructions(&mut self, name: &str, instructions: &str) -> Result<()> {
        let agent = self
            .agent_mut(name)
            .ok_or_else(|| anyhow!("Agent not found: {name}"))?;
        if instructions.is_empty() {
            bail!("No agent instructions provided.");
        }
        agent.instructions = instructions.to_string();
        Ok(())
    }

    /// Replace the down-chains of `name`, keeping the given order.
    pub fn set_down_chains<S: AsRef<str>>(&mut self, name: &str, down_chains: &[S]) -> Result<()> {
        let agent = self
            .agent_mut(name)
            .ok_or_else(|| anyhow!("Agent not found: {name}"))?;
        agent.down_chains = down_chains
            .iter()
            .map(|child| child.as_ref().to_string())
            .collect();
        Ok(())
    }
}
