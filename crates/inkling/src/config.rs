//! Evaluation limits.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;
pub const DEFAULT_MAX_ELEMENTS: usize = 1_000_000;

/// Bounds that keep evaluation total: exceeding one yields an error value
/// instead of exhausting the stack or memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Nested function applications allowed before a Limit error
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Largest range that may be materialized into an array
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
}

fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

fn default_max_elements() -> usize {
    DEFAULT_MAX_ELEMENTS
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}
