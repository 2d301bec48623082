use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    AgentflowError, Result,
    model::{EdgeConfig, WorkerConfig},
};

/// Persistence shape of a whole execution graph.
///
/// Worker and edge maps are keyed by ulid; hydration iterates keys in
/// sorted order, so insertion order is creation order and iteration is a
/// documented contract rather than a map-implementation accident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentModel {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub workers: HashMap<String, WorkerConfig>,
    #[serde(default)]
    pub edges: HashMap<String, EdgeConfig>,
}

impl AgentModel {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<AgentModel>(s).map_err(|e| AgentflowError::Agent(format!("{}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AgentflowError::Convert(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use crate::{AgentModel, HandleDirection, IoType};

    #[test]
    fn test_model_from_json() {
        let json = r#"{
            "id": "agent-1",
            "title": "demo",
            "workers": {
                "NODE_01J8": {
                    "type": "request",
                    "handles": {
                        "text": { "id": "h1", "direction": "output", "type": "string" }
                    }
                }
            },
            "edges": {
                "01J9": { "source": "NODE_01J8", "target": "NODE_01J9", "sourceHandle": "h1", "targetHandle": "h2" }
            }
        }"#;

        let model = AgentModel::from_json(json).unwrap();
        assert_eq!(model.title, "demo");
        assert_eq!(model.workers.len(), 1);
        assert_eq!(model.edges.len(), 1);

        let worker = &model.workers["NODE_01J8"];
        assert_eq!(worker.kind, "request");
        let handle = &worker.handles["text"];
        assert_eq!(handle.direction, HandleDirection::Output);
        assert_eq!(handle.io_type, IoType::String);

        let edge = &model.edges["01J9"];
        assert_eq!(edge.source_handle, "h1");
        assert_eq!(edge.target_handle, "h2");
    }

    #[test]
    fn test_model_rejects_invalid_json() {
        assert!(AgentModel::from_json("{").is_err());
    }
}
