//! Deterministic, pure logic for agent networks.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! networks and return deterministic outputs suitable for tests.

pub mod edit;
pub mod extract;
pub mod invariants;
pub mod order;
pub mod render;
pub mod topology;
pub mod types;
