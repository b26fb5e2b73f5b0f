//! Stable exit codes for designer CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Input rejected: validation defects, missing input, or an unusable definition/config.
pub const INVALID: i32 = 1;
/// Storage failure while writing a document or updating the manifest.
pub const STORAGE: i32 = 2;
