//! Directed connections between worker handles.

use crate::{
    graph::{handle::HandleId, worker::WorkerId},
    model::EdgeConfig,
};

/// Unique identifier for an edge within an agent.
pub type EdgeId = String;

/// A directed connection from one worker's output handle to another
/// worker's input handle.
///
/// Edges reference their endpoints by id and own nothing; an edge whose
/// endpoint no longer resolves is treated as "no producer" at traversal
/// time, never as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: WorkerId,
    pub source_handle: HandleId,
    pub target: WorkerId,
    pub target_handle: HandleId,
}

impl Edge {
    pub(crate) fn from_config(
        id: &str,
        config: EdgeConfig,
    ) -> Self {
        Self {
            id: id.to_string(),
            source: config.source,
            source_handle: config.source_handle,
            target: config.target,
            target_handle: config.target_handle,
        }
    }

    pub(crate) fn to_config(&self) -> EdgeConfig {
        EdgeConfig {
            source: self.source.clone(),
            source_handle: self.source_handle.clone(),
            target: self.target.clone(),
            target_handle: self.target_handle.clone(),
        }
    }
}
