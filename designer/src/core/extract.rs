//! Read a rendered network document back into a [`Network`].
//!
//! Only the layout written by [`crate::core::render`] is understood: one block
//! per agent starting at its `"name"` line, with `"instructions"` and an
//! optional `"tools"` list. Substitutions such as `${instructions_prefix}` are
//! never expanded, so only the agent's own instruction text is recovered.

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::network::{Agent, Network};

/// Demo-mode sentence carried by the document header.
pub const DEMO_MODE: &str = "You are part of a demo system, so when queried, make up a realistic response as if you are actually grounded in real data or you are operating a real application API or microservice.";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*"name"[ \t]*[:=][ \t]*("(?:[^"\\\n]|\\.)*")"#)
        .expect("name pattern should be valid")
});

static INSTRUCTIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)"instructions"\s*[:=]\s*(?:\$\{\w+\}\s*)*(?:"""(.*?)"""|("(?:[^"\\]|\\.)*"))"#,
    )
    .expect("instructions pattern should be valid")
});

static TOOLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""tools"\s*[:=]\s*\[([^\]]*)\]"#).expect("tools pattern should be valid")
});

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("quoted pattern should be valid")
});

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"You are part of a .+? of assistants\.\s*",
        r"Only answer inquiries that are directly within your area of expertise\.\s*",
        r"Do not try to help for other matters\.\s*",
        r"Do not mention what you can NOT do\. Only mention what you can do\.",
    ))
    .expect("prefix pattern should be valid")
});

/// Rebuild the network definition from a rendered document.
///
/// Agents come back in document order, which puts the top agent first.
/// Instructions pass through [`custom_instructions`].
pub fn network_from_document(document: &str) -> Result<Network> {
    let names: Vec<_> = NAME_RE.captures_iter(document).collect();
    if names.is_empty() {
        bail!("document contains no agent blocks");
    }

    let mut network = Network::new();
    for (i, caps) in names.iter().enumerate() {
        let (Some(whole), Some(quoted)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = names
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(document.len(), |next| next.start());
        let block = &document[whole.end()..end];
        let name = unquote(quoted.as_str())?;

        let instructions = match INSTRUCTIONS_RE.captures(block) {
            Some(found) => match (found.get(1), found.get(2)) {
                (Some(raw), _) => custom_instructions(raw.as_str()),
                (None, Some(quoted)) => custom_instructions(&unquote(quoted.as_str())?),
                (None, None) => String::new(),
            },
            None => String::new(),
        };
        let down_chains = match TOOLS_RE.captures(block).and_then(|found| found.get(1)) {
            Some(list) => QUOTED_RE
                .find_iter(list.as_str())
                .map(|tool| unquote(tool.as_str()))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("read tools of agent '{name}'"))?,
            None => Vec::new(),
        };

        network.insert(
            name,
            Agent {
                instructions,
                down_chains,
            },
        );
    }
    Ok(network)
}

/// Agent-specific part of an instruction text: whitespace collapsed, with the
/// network instruction prefix and the demo-mode sentence removed.
pub fn custom_instructions(instructions: &str) -> String {
    let collapsed = collapse_whitespace(instructions);
    let without_prefix = PREFIX_RE.replace_all(&collapsed, "");
    collapse_whitespace(&without_prefix.replace(DEMO_MODE, ""))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unquote(quoted: &str) -> Result<String> {
    serde_json::from_str(quoted).with_context(|| format!("unquote {quoted}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_network;
    use crate::core::types::HeaderOptions;
    use crate::test_support::network;

    #[test]
    fn rendered_network_reads_back_unchanged() {
        let net = network(&[
            ("router", "Route requests.", &["billing", "claims"]),
            ("billing", "Handle billing.", &[]),
            ("claims", "Handle claims.", &["adjuster"]),
            ("adjuster", "Assess damage.", &[]),
        ]);
        let doc = render_network(&net, "insurance", &HeaderOptions::default()).expect("render");

        assert_eq!(network_from_document(&doc).expect("read back"), net);
    }

    #[test]
    fn read_back_follows_document_order() {
        let net = network(&[("leaf", "Leaf.", &[]), ("top", "Top.", &["leaf"])]);
        let doc = render_network(&net, "pair", &HeaderOptions::default()).expect("render");

        let read = network_from_document(&doc).expect("read back");
        assert_eq!(read.names(), ["top", "leaf"]);
        assert_eq!(read.down_chains("top"), ["leaf"]);
        assert!(read.agent("leaf").expect("leaf").is_leaf());
    }

    #[test]
    fn multi_line_instructions_are_collapsed() {
        let net = network(&[("top", "Step one.\n  Step two.", &["leaf"]), ("leaf", "x", &[])]);
        let doc = render_network(&net, "steps", &HeaderOptions::default()).expect("render");

        let read = network_from_document(&doc).expect("read back");
        assert_eq!(read.agent("top").expect("top").instructions, "Step one. Step two.");
    }

    #[test]
    fn inline_prefix_and_demo_mode_are_stripped() {
        let text = format!(
            "You are part of a support of assistants.\n\
             Only answer inquiries that are directly within your area of expertise.\n\
             Do not try to help for other matters.\n\
             Do not mention what you can NOT do. Only mention what you can do.\n\
             {DEMO_MODE}\n  Answer   billing questions."
        );
        assert_eq!(custom_instructions(&text), "Answer billing questions.");
    }

    #[test]
    fn hand_written_block_with_plain_strings() {
        let doc = concat!(
            "{\n",
            "  \"tools\": [\n",
            "    {\n",
            "      \"name\": \"front\",\n",
            "      \"instructions\": \"Greet \\\"everyone\\\".\",\n",
            "      \"tools\": [\"back\"]\n",
            "    },\n",
            "    {\n",
            "      \"name\": \"back\"\n",
            "    }\n",
            "  ]\n",
            "}\n",
        );
        let read = network_from_document(doc).expect("read");
        assert_eq!(read.names(), ["front", "back"]);
        assert_eq!(read.agent("front").expect("front").instructions, "Greet \"everyone\".");
        assert_eq!(read.down_chains("front"), ["back"]);
        assert!(read.agent("back").expect("back").instructions.is_empty());
    }

    #[test]
    fn document_without_agents_is_an_error() {
        let err = network_from_document("{\n}\n").unwrap_err();
        assert!(err.to_string().contains("no agent blocks"));
    }
}
