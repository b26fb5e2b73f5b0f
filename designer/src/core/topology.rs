//! Graph analyses over down-chain edges.
//!
//! Every traversal is iterative with an explicit stack, so deep or pathological
//! networks cannot exhaust the call stack. Down-chain names that are not agents
//! of the network are skipped.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::network::Network;

/// Agents with down-chains that are never anyone's down-chain.
pub fn find_top_agents(network: &Network) -> BTreeSet<String> {
    let mut has_down_chains = BTreeSet::new();
    let mut as_down_chains = HashSet::new();

    for (name, agent) in network.agents() {
        if agent.down_chains.is_empty() {
            continue;
        }
        has_down_chains.insert(name.to_string());
        as_down_chains.extend(agent.down_chains.iter().map(String::as_str));
    }

    has_down_chains.retain(|name| !as_down_chains.contains(name.as_str()));
    has_down_chains
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Agents that sit on at least one directed cycle.
///
/// Three-colour DFS restarted from every unvisited agent in definition order.
/// The frame stack doubles as the current path: on a back edge to an
/// in-progress agent, every agent from its frame to the top is cyclical.
pub fn find_cyclical_agents(network: &Network) -> BTreeSet<String> {
    let mut state: HashMap<&str, Visit> = network
        .names()
        .iter()
        .map(|name| (name.as_str(), Visit::Unvisited))
        .collect();
    let mut cyclical = BTreeSet::new();

    for start in network.names() {
        if state.get(start.as_str()) != Some(&Visit::Unvisited) {
            continue;
        }

        // (agent, index of the next down-chain to follow)
        let mut frames: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        state.insert(start.as_str(), Visit::InProgress);

        while let Some(&(agent, next)) = frames.last() {
            let children = network.down_chains(agent);
            let Some(child) = children.get(next).map(String::as_str) else {
                frames.pop();
                state.insert(agent, Visit::Done);
                continue;
            };
            if let Some(frame) = frames.last_mut() {
                frame.1 += 1;
            }

            match state.get(child).copied() {
                None | Some(Visit::Done) => {}
                Some(Visit::InProgress) => {
                    if let Some(pos) = frames.iter().position(|(name, _)| *name == child) {
                        cyclical.extend(frames[pos..].iter().map(|(name, _)| name.to_string()));
                    }
                }
                Some(Visit::Unvisited) => {
                    state.insert(child, Visit::InProgress);
                    frames.push((child, 0));
                }
            }
        }
    }

    cyclical
}

/// Agents reachable from `top`, including `top` itself when it exists.
pub fn reachable_from<'a>(network: &'a Network, top: &str) -> HashSet<&'a str> {
    let mut reachable = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    if let Some((name, _)) = network.agents().find(|(name, _)| *name == top) {
        stack.push(name);
    }

    while let Some(agent) = stack.pop() {
        if !reachable.insert(agent) {
            continue;
        }
        for child in network.down_chains(agent).iter().rev() {
            if network.has_node(child) && !reachable.contains(child.as_str()) {
                stack.push(child.as_str());
            }
        }
    }

    reachable
}

/// Agents of the network that `top` cannot reach through down-chains.
pub fn find_unreachable_agents(network: &Network, top: &str) -> BTreeSet<String> {
    let reachable = reachable_from(network, top);
    network
        .names()
        .iter()
        .filter(|name| !reachable.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Down-chain names that are not agents of the network.
pub fn find_dangling_references(network: &Network) -> BTreeSet<String> {
    network
        .agents()
        .flat_map(|(_, agent)| agent.down_chains.iter())
        .filter(|child| !network.has_node(child))
        .cloned()
        .collect()
}

/// `(agent, child)` pairs where `child` appears more than once in the agent's
/// down-chains, in definition order.
pub fn find_duplicate_down_chains(network: &Network) -> Vec<(String, String)> {
    let mut duplicates = Vec::new();
    for (name, agent) in network.agents() {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for child in &agent.down_chains {
            if !seen.insert(child.as_str()) && reported.insert(child.as_str()) {
                duplicates.push((name.to_string(), child.clone()));
            }
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{network, set};

    #[test]
    fn top_agents_empty_when_nobody_has_down_chains() {
        let net = network(&[("a", "x", &[]), ("b", "y", &[])]);
        assert!(find_top_agents(&net).is_empty());
    }

    #[test]
    fn top_agents_lists_disjoint_parents() {
        let net = network(&[
            ("zed", "x", &["c1"]),
            ("c1", "x", &[]),
            ("amy", "x", &["c2"]),
            ("c2", "x", &[]),
        ]);
        assert_eq!(find_top_agents(&net), set(&["amy", "zed"]));
    }

    #[test]
    fn three_cycle_reports_only_cycle_members() {
        let net = network(&[
            ("outside", "x", &["A"]),
            ("A", "x", &["B"]),
            ("B", "x", &["C"]),
            ("C", "x", &["A"]),
            ("tail", "x", &[]),
        ]);
        assert_eq!(find_cyclical_agents(&net), set(&["A", "B", "C"]));
    }

    #[test]
    fn self_loop_is_cyclical() {
        let net = network(&[("solo", "x", &["solo"])]);
        assert_eq!(find_cyclical_agents(&net), set(&["solo"]));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let net = network(&[
            ("top", "x", &["left", "right"]),
            ("left", "x", &["bottom"]),
            ("right", "x", &["bottom"]),
            ("bottom", "x", &[]),
        ]);
        assert!(find_cyclical_agents(&net).is_empty());
    }

    #[test]
    fn cycle_in_disconnected_component_is_found() {
        let net = network(&[
            ("top", "x", &["leaf"]),
            ("leaf", "x", &[]),
            ("p", "x", &["q"]),
            ("q", "x", &["p"]),
        ]);
        assert_eq!(find_cyclical_agents(&net), set(&["p", "q"]));
    }

    #[test]
    fn cycle_detection_skips_dangling_children() {
        let net = network(&[("top", "x", &["ghost", "leaf"]), ("leaf", "x", &[])]);
        assert!(find_cyclical_agents(&net).is_empty());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let names: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut net = Network::new();
        for (i, name) in names.iter().enumerate() {
            let children: Vec<&str> = names.get(i + 1).map(String::as_str).into_iter().collect();
            net.insert(name.clone(), crate::network::Agent::new("x", &children));
        }
        assert!(find_cyclical_agents(&net).is_empty());
        assert!(find_unreachable_agents(&net, "n0").is_empty());
    }

    #[test]
    fn valid_tree_has_no_unreachable_agents() {
        let net = network(&[
            ("root", "x", &["B", "C"]),
            ("B", "x", &["D"]),
            ("C", "x", &[]),
            ("D", "x", &[]),
        ]);
        assert!(find_unreachable_agents(&net, "root").is_empty());
    }

    #[test]
    fn isolated_agent_is_unreachable() {
        let net = network(&[
            ("root", "x", &["B", "C"]),
            ("B", "x", &["D"]),
            ("C", "x", &[]),
            ("D", "x", &[]),
            ("E", "x", &[]),
        ]);
        assert_eq!(find_unreachable_agents(&net, "root"), set(&["E"]));
    }

    #[test]
    fn dangling_references_are_collected_once() {
        let net = network(&[("top", "x", &["ghost", "leaf"]), ("leaf", "x", &["ghost"])]);
        assert_eq!(find_dangling_references(&net), set(&["ghost"]));
    }

    #[test]
    fn duplicate_down_chains_reported_once_per_child() {
        let net = network(&[
            ("top", "x", &["a", "a", "b", "a"]),
            ("a", "x", &[]),
            ("b", "x", &[]),
        ]);
        assert_eq!(
            find_duplicate_down_chains(&net),
            vec![("top".to_string(), "a".to_string())]
        );
    }
}
