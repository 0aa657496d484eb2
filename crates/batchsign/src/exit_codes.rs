//! Exit codes for the CLI

/// Success, including runs that stopped early for lack of a certificate
pub const SUCCESS: i32 = 0;

/// The run was reported as failed
pub const FAILURE: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;
