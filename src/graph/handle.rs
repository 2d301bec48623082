//! Input/output slots on a worker.

use serde::{Deserialize, Serialize};

use crate::{
    graph::value::{IoType, IoValue},
    model::HandleConfig,
    utils,
};

/// Unique identifier for a handle within its owning worker.
pub type HandleId = String;

/// Direction of a handle relative to its worker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HandleDirection {
    #[default]
    Input,
    Output,
}

/// A named, typed input or output slot on a worker, holding a runtime value.
///
/// Handles have no behavior of their own; every handle belongs to exactly
/// one worker, and `name` is unique among siblings (last registration wins).
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    pub id: HandleId,
    /// registry-facing lookup name, unique within the owning worker
    pub name: String,
    pub direction: HandleDirection,
    pub io_type: IoType,
    /// hidden from end-user editing surfaces
    pub is_system: bool,
    /// marks this input as the gating condition input
    pub is_condition: bool,
    /// the handle's value survives serialization
    pub is_persistent: bool,
    pub value: IoValue,
}

impl Handle {
    /// Build a handle from its persistence shape. `key` is the name key of
    /// the owning `handles` map and is used when the config carries no name.
    pub(crate) fn from_config(
        key: &str,
        config: HandleConfig,
    ) -> Self {
        let io_type = config.io_type;
        Self {
            id: config.id.unwrap_or_else(utils::handle_id),
            name: config.name.unwrap_or_else(|| key.to_string()),
            direction: config.direction,
            io_type,
            is_system: config.is_system,
            is_condition: config.is_condition,
            is_persistent: config.is_persistent,
            value: config.value.map(|v| IoValue::from_json(io_type, v)).unwrap_or_default(),
        }
    }

    /// Serialize back to the persistence shape. Values are runtime-only and
    /// are only written back for persistent handles.
    pub(crate) fn to_config(&self) -> HandleConfig {
        let value = if self.is_persistent && self.value != IoValue::Null {
            Some(self.value.to_json())
        } else {
            None
        };
        HandleConfig {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            direction: self.direction,
            io_type: self.io_type,
            is_system: self.is_system,
            is_condition: self.is_condition,
            is_persistent: self.is_persistent,
            value,
        }
    }
}

/// Partial update applied by `Worker::update_handle`; `None` fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct HandlePatch {
    pub name: Option<String>,
    pub direction: Option<HandleDirection>,
    pub io_type: Option<IoType>,
    pub is_system: Option<bool>,
    pub is_condition: Option<bool>,
    pub is_persistent: Option<bool>,
    pub value: Option<IoValue>,
}

impl HandlePatch {
    pub fn value(value: IoValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{Handle, HandleDirection, IoValue};
    use crate::model::HandleConfig;

    #[test]
    fn test_handle_from_config_defaults() {
        let handle = Handle::from_config("text", HandleConfig::default());
        assert!(handle.id.starts_with("HNDL_"));
        assert_eq!(handle.name, "text");
        assert_eq!(handle.direction, HandleDirection::Input);
        assert_eq!(handle.value, IoValue::Null);
    }

    #[test]
    fn test_handle_value_round_trip_persistent_only() {
        let mut config = HandleConfig::output("text", crate::IoType::String);
        config.value = Some(json!("hi"));
        let mut handle = Handle::from_config("text", config);
        assert_eq!(handle.value, IoValue::String("hi".into()));

        // runtime-only by default
        assert_eq!(handle.to_config().value, None);

        handle.is_persistent = true;
        assert_eq!(handle.to_config().value, Some(json!("hi")));
    }
}
