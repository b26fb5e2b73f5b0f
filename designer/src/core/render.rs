//! HOCON rendering of a validated agent network.
//!
//! Each agent becomes one block chosen by its [`AgentRole`]; blocks are wrapped
//! in a fixed header and trailer. Rendering is pure: the same network, name and
//! header always produce byte-identical output.

use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};

use crate::core::invariants::top_agent;
use crate::core::order::render_order;
use crate::core::types::{AgentRole, HeaderOptions};
use crate::network::{Agent, Network};

const HEADER_TEMPLATE: &str = include_str!("templates/header.hocon");
const TRAILER_TEMPLATE: &str = include_str!("templates/trailer.hocon");
const TOP_AGENT_TEMPLATE: &str = include_str!("templates/top_agent.hocon");
const REGULAR_AGENT_TEMPLATE: &str = include_str!("templates/regular_agent.hocon");
const LEAF_AGENT_TEMPLATE: &str = include_str!("templates/leaf_agent.hocon");

// Template names end in `.hocon` so minijinja applies no auto-escaping.
static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    for (name, source) in [
        ("header.hocon", HEADER_TEMPLATE),
        ("trailer.hocon", TRAILER_TEMPLATE),
        ("top_agent.hocon", TOP_AGENT_TEMPLATE),
        ("regular_agent.hocon", REGULAR_AGENT_TEMPLATE),
        ("leaf_agent.hocon", LEAF_AGENT_TEMPLATE),
    ] {
        env.add_template(name, source)
            .expect("network templates should be valid");
    }
    env
});

impl AgentRole {
    fn template_name(self) -> &'static str {
        match self {
            AgentRole::Top => "top_agent.hocon",
            AgentRole::Regular => "regular_agent.hocon",
            AgentRole::Leaf => "leaf_agent.hocon",
        }
    }
}

/// Role of `agent`, given the network's top agent name.
pub fn role_of(name: &str, agent: &Agent, top: &str) -> AgentRole {
    if name == top {
        AgentRole::Top
    } else if agent.is_leaf() {
        AgentRole::Leaf
    } else {
        AgentRole::Regular
    }
}

/// Quote each name and join with commas: `"a","b"`. Empty input yields `""`.
pub fn quote_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render `network` as one HOCON document named `network_name`.
///
/// The network must already have passed `validate_network` with no defects;
/// only the top agent lookup is repeated here.
pub fn render_network(
    network: &Network,
    network_name: &str,
    header: &HeaderOptions,
) -> Result<String> {
    let top = top_agent(network).context("locate top agent for rendering")?;

    let mut document = TEMPLATES.get_template("header.hocon")?.render(context! {
        network_name => network_name,
        header => header,
    })?;

    for name in render_order(network, top) {
        let agent = network
            .agent(name)
            .ok_or_else(|| anyhow!("agent '{name}' vanished during rendering"))?;
        document.push_str(&render_agent(name, agent, role_of(name, agent, top))?);
    }

    document.push_str(&TEMPLATES.get_template("trailer.hocon")?.render(context! {})?);
    Ok(document)
}

fn render_agent(name: &str, agent: &Agent, role: AgentRole) -> Result<String> {
    let template = TEMPLATES.get_template(role.template_name())?;
    let rendered = template
        .render(context! {
            name => name,
            instructions => agent.instructions.as_str(),
            tools => quote_names(&agent.down_chains),
        })
        .with_context(|| format!("render agent '{name}'"))?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::network;

    fn three_agent_network() -> Network {
        network(&[
            ("R", "Route requests.", &["B", "C"]),
            ("B", "Handle billing.", &[]),
            ("C", "Handle claims.", &[]),
        ])
    }

    #[test]
    fn quote_names_joins_without_trailing_comma() {
        let names = vec!["B".to_string(), "C".to_string()];
        assert_eq!(quote_names(&names), r#""B","C""#);
        assert_eq!(quote_names(&[]), "");
    }

    #[test]
    fn roles_follow_position_and_down_chains() {
        let net = network(&[("top", "x", &["mid"]), ("mid", "x", &["leaf"]), ("leaf", "x", &[])]);
        let roles: Vec<AgentRole> = net
            .agents()
            .map(|(name, agent)| role_of(name, agent, "top"))
            .collect();
        assert_eq!(roles, vec![AgentRole::Top, AgentRole::Regular, AgentRole::Leaf]);
    }

    #[test]
    fn top_agent_block_comes_first_then_definition_order() {
        let doc = render_network(&three_agent_network(), "support", &HeaderOptions::default())
            .expect("render");

        let r = doc.find(r#""name": "R""#).expect("R block");
        let b = doc.find(r#""name": "B""#).expect("B block");
        let c = doc.find(r#""name": "C""#).expect("C block");
        assert!(r < b && b < c);
        assert!(doc.contains(r#""tools": ["B","C"]"#));
        assert!(doc.contains("An assistant that answer inquiries from the user."));
        // Leaf blocks carry demo mode and no tools field.
        assert_eq!(doc.matches("${demo_mode}").count(), 2);
        assert_eq!(doc.matches(r#""tools": [""#).count(), 1);
    }

    #[test]
    fn top_agent_is_relocated_to_front() {
        let net = network(&[
            ("leaf", "Leaf work.", &[]),
            ("mid", "Middle work.", &["leaf"]),
            ("top", "Top work.", &["mid"]),
        ]);
        let doc = render_network(&net, "chain", &HeaderOptions::default()).expect("render");

        let top = doc.find(r#""name": "top""#).expect("top");
        let leaf = doc.find(r#""name": "leaf""#).expect("leaf");
        let mid = doc.find(r#""name": "mid""#).expect("mid");
        assert!(top < leaf && leaf < mid);
        assert!(doc.contains(r#""command": ${aaosa_command}"#));
        assert!(doc.contains(r#""tools": ["leaf"]"#));
    }

    #[test]
    fn leaf_block_is_exact() {
        let agent = Agent::new("Answer billing questions.", &[]);
        let block = render_agent("billing", &agent, AgentRole::Leaf).expect("render");
        assert_eq!(
            block,
            concat!(
                "        {\n",
                "            \"name\": \"billing\",\n",
                "            \"function\": ${aaosa_call},\n",
                "            \"instructions\": ${instructions_prefix} ${demo_mode} \"\"\"\n",
                "Answer billing questions.\n",
                "\"\"\",\n",
                "        },\n",
            )
        );
    }

    #[test]
    fn top_block_is_exact() {
        let agent = Agent::new("Route requests.", &["billing", "claims"]);
        let block = render_agent("router", &agent, AgentRole::Top).expect("render");
        assert_eq!(
            block,
            concat!(
                "        {\n",
                "            \"name\": \"router\",\n",
                "            \"function\": {\n",
                "                \"description\": \"\"\"\n",
                "An assistant that answer inquiries from the user.\n",
                "                \"\"\"\n",
                "            },\n",
                "            \"instructions\": ${instructions_prefix} \"\"\"\n",
                "Route requests.\n",
                "\"\"\" ${aaosa_instructions},\n",
                "            \"tools\": [\"billing\",\"claims\"]\n",
                "        },\n",
            )
        );
    }

    #[test]
    fn regular_block_is_exact() {
        let agent = Agent::new("Handle claims.", &["adjuster"]);
        let block = render_agent("claims", &agent, AgentRole::Regular).expect("render");
        assert_eq!(
            block,
            concat!(
                "        {\n",
                "            \"name\": \"claims\",\n",
                "            \"function\": ${aaosa_call},\n",
                "            \"instructions\": ${instructions_prefix} \"\"\"\n",
                "Handle claims.\n",
                "\"\"\" ${aaosa_instructions},\n",
                "            \"command\": ${aaosa_command},\n",
                "            \"tools\": [\"adjuster\"]\n",
                "        },\n",
            )
        );
    }

    #[test]
    fn header_interpolates_name_and_options_and_trailer_closes() {
        let header = HeaderOptions {
            model_name: "local-model".to_string(),
            aaosa_include: "conf/aaosa.hocon".to_string(),
        };
        let doc = render_network(&three_agent_network(), "insurance", &header).expect("render");

        assert!(doc.starts_with("{\n# Importing content from other HOCON files\n"));
        assert!(doc.contains("You are part of a insurance of assistants.\n"));
        assert!(doc.contains("    include \"conf/aaosa.hocon\"\n"));
        assert!(doc.contains("\"model_name\": \"local-model\","));
        assert!(doc.ends_with("        },\n]\n}\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let net = three_agent_network();
        let first = render_network(&net, "support", &HeaderOptions::default()).expect("first");
        let second = render_network(&net, "support", &HeaderOptions::default()).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn instructions_are_not_escaped() {
        let net = network(&[
            ("top", "Use <b>tags</b> & \"quotes\" {{ as-is }}", &["leaf"]),
            ("leaf", "x", &[]),
        ]);
        let doc = render_network(&net, "raw", &HeaderOptions::default()).expect("render");
        assert!(doc.contains("Use <b>tags</b> & \"quotes\" {{ as-is }}\n"));
    }

    #[test]
    fn rendering_without_top_agent_fails() {
        let net = network(&[("a", "x", &[])]);
        let err = render_network(&net, "broken", &HeaderOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("No top agent found in network"));
    }
}
