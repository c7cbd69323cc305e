//! Project-wide constants.

use std::path::PathBuf;

/// Default per-backend call budget, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Default scratch directory for the subprocess backend: a neutral spot
/// under the system temp dir, never the caller's project.
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("quorum-scratch")
}
