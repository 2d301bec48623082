use std::{fs, path::Path};

use serde::Deserialize;

use crate::{AgentflowError, Result};

/// Default capacity of the execution event broadcast queue.
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// capacity of the execution event broadcast queue, defaults to 256
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

fn default_event_queue_capacity() -> usize {
    DEFAULT_EVENT_QUEUE_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<Config>(toml_str).map_err(|e| AgentflowError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        event_queue_capacity = 64
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.event_queue_capacity, 64);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.event_queue_capacity, 256);
    }
}
