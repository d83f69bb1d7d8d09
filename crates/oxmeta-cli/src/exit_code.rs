//! Exit codes for the CLI.
//!
//! These follow common Unix conventions and provide meaningful
//! status information for scripting and automation.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments)
#[allow(dead_code)] // Emitted by clap itself
pub const USAGE_ERROR: u8 = 2;

/// Unknown user or folder, or no metadata where some was required
pub const NOT_FOUND: u8 = 3;

/// Metadata already exists, or the folder is not locked
pub const CONFLICT: u8 = 4;

/// Folder is locked by another client (retry later)
pub const LOCKED: u8 = 5;

/// Write or unlock without holding the lock
pub const PERMISSION_DENIED: u8 = 6;

/// Backing storage failed or holds corrupt data
pub const STORAGE_FAILED: u8 = 7;
