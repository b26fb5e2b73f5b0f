//! Deterministic render order for agents.

use crate::network::Network;

/// Agent names with `top` first, followed by every other agent in definition
/// order.
pub fn render_order<'a>(network: &'a Network, top: &str) -> Vec<&'a str> {
    let mut order = Vec::with_capacity(network.node_count());
    order.extend(network.names().iter().map(String::as_str).filter(|name| *name == top));
    order.extend(network.names().iter().map(String::as_str).filter(|name| *name != top));
    order
}
