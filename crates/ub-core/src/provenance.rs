//! Provenance descriptors attached to generated reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance information attached to every serialized report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Hash of the input record log (or configuration) used to produce the data.
    pub input_hash: String,
    /// ISO-8601 timestamp recording when the artifact was generated.
    pub created_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Creates a provenance block stamped with a single tool version.
    pub fn new(
        input_hash: impl Into<String>,
        created_at: impl Into<String>,
        tool: &str,
        version: &str,
    ) -> Self {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(tool.to_string(), version.to_string());
        Self {
            input_hash: input_hash.into(),
            created_at: created_at.into(),
            tool_versions,
        }
    }
}
