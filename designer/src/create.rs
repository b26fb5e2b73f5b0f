//! Validate → render → publish pipeline behind `designer render` and
//! `designer create`.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::core::render::render_network;
use crate::io::config::DesignerConfig;
use crate::io::registry::{ArtifactStore, IndexStore, PublishOutcome, publish};
use crate::network::Network;
use crate::validate::{validate_definition, validate_network_name};

/// Outcome of rendering a network that may be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Input failed validation; nothing was rendered.
    Rejected { defects: Vec<String> },
    Rendered { document: String },
}

/// Outcome of `create_network`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Input failed validation; nothing was rendered or written.
    Rejected { defects: Vec<String> },
    Created {
        document: String,
        publish: PublishOutcome,
    },
}

/// Validate `network` and `name`, then render. Never touches storage.
pub fn render_checked(
    network: &Network,
    name: &str,
    config: &DesignerConfig,
) -> Result<RenderOutcome> {
    let mut defects = validate_network_name(name);
    let outcome = validate_definition(network, &config.validation_options());
    defects.extend(outcome.defects);
    if !defects.is_empty() {
        error!(name, defects = ?defects, "agent network rejected");
        return Ok(RenderOutcome::Rejected { defects });
    }
    for warning in &outcome.warnings {
        warn!(name, "{warning}");
    }

    let document = render_network(network, name, &config.header_options())
        .with_context(|| format!("render agent network '{name}'"))?;
    Ok(RenderOutcome::Rendered { document })
}

/// Validate, render and publish `network` as `name` through `store`.
///
/// Storage errors propagate; a document written without its manifest entry is
/// reported by `publish`.
pub fn create_network<S: ArtifactStore + IndexStore>(
    store: &S,
    network: &Network,
    name: &str,
    config: &DesignerConfig,
) -> Result<CreateOutcome> {
    let document = match render_checked(network, name, config)? {
        RenderOutcome::Rejected { defects } => return Ok(CreateOutcome::Rejected { defects }),
        RenderOutcome::Rendered { document } => document,
    };

    let publish = publish(store, name, &document)?;
    info!(
        name,
        path = %publish.document_path.display(),
        registered = ?publish.registered,
        "agent network created"
    );
    Ok(CreateOutcome::Created { document, publish })
}
