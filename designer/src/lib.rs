//! Agent network designer.
//!
//! Validates the topology of a hierarchical agent network (one top agent,
//! no cycles, everything reachable, instructions everywhere) and renders it
//! into a HOCON configuration registered in a shared manifest. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (topology analysis, invariants,
//!   render order, templates). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, definition files, the
//!   document store and manifest).
//!
//! Orchestration modules ([`validate`], [`create`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod core;
pub mod create;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod network;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
