//! Exit codes for the scopeload CLI.
//! These codes are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const LOAD_FAILED: i32 = 1; // At least one resource failed or timed out
pub const CONFIG_ERROR: i32 = 2; // Invalid flags, URLs or environment
