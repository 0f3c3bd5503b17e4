//! Debug options for the arbitration core
//!
//! Controls which conflict diagnostics the resolution pass emits. Loaded
//! from a JSON file by the embedding application; every field has a default
//! so a partial (or absent) file is fine.

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DebugOptions {
    /// Report unresolved handler conflicts to the diagnostic sink (default: true)
    #[serde(default = "default_true")]
    pub report_conflicts: bool,

    /// Also report conflicts the pass managed to resolve (default: false)
    #[serde(default)]
    pub verbose: bool,

    /// Restrict verbose reporting to a single command id
    #[serde(default)]
    pub verbose_command_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            report_conflicts: true,
            verbose: false,
            verbose_command_id: None,
        }
    }
}

impl DebugOptions {
    /// Whether a resolved conflict for `command_id` should be traced.
    pub(crate) fn trace_resolved(&self, command_id: &str) -> bool {
        self.verbose
            && self
                .verbose_command_id
                .as_deref()
                .is_none_or(|id| id == command_id)
    }
}

/// Load debug options from a JSON file.
pub fn load_debug_options(path: &Path) -> anyhow::Result<DebugOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read debug options from {}", path.display()))?;
    let options = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse debug options in {}", path.display()))?;
    Ok(options)
}
