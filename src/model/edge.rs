use serde::{Deserialize, Serialize};

/// Persistence shape of a directed connection between two handles.
///
/// The edge id is the key of the owning map in [`AgentModel`](crate::AgentModel).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    /// id of the source worker
    pub source: String,
    /// id of the target worker
    pub target: String,
    /// id of the output handle on the source worker
    pub source_handle: String,
    /// id of the input handle on the target worker
    pub target_handle: String,
}
