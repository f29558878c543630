//! Node configuration loaded from JSON.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use harvest_spec::{ActionType, Desirability, VariabilityDamper, MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};

use crate::codec::ENCODE_BUFFER_MIN_SIZE;
use crate::error::ConfigError;
use crate::registry::MAX_NUM_ACTIONS;
use crate::store::DATA_DEFAULT_ARENA_BYTES;

/// Smallest arena accepted; room for the largest single item.
pub const ARENA_MIN_BYTES: usize = 512;

/// Everything needed to build a [`Node`](crate::Node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Name carried in every frame and expected in every acknowledgement.
    pub device_id: String,
    /// Arena size in bytes.
    pub arena_bytes: usize,
    /// Action pool size.
    pub max_actions: usize,
    /// Size of the buffer handed to the codec.
    pub encode_buffer_bytes: usize,
    /// Per-type desirability overrides.
    pub desirability: BTreeMap<ActionType, Desirability>,
    /// Per-type variability damper overrides.
    pub variability_damper: BTreeMap<ActionType, VariabilityDamper>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "harvest-node".into(),
            arena_bytes: DATA_DEFAULT_ARENA_BYTES,
            max_actions: MAX_NUM_ACTIONS,
            encode_buffer_bytes: ENCODE_BUFFER_MIN_SIZE,
            desirability: BTreeMap::new(),
            variability_damper: BTreeMap::new(),
        }
    }
}

impl NodeConfig {
    /// Parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse and validate JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() || self.device_id.len() > MAX_NAME_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "device_id must be 1..={MAX_NAME_LENGTH} bytes, got {}",
                self.device_id.len()
            )));
        }
        if self
            .device_id
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_control())
        {
            return Err(ConfigError::Invalid(
                "device_id must not contain quotes, backslashes or control characters".into(),
            ));
        }
        if self.arena_bytes < ARENA_MIN_BYTES {
            return Err(ConfigError::Invalid(format!(
                "arena_bytes must be at least {ARENA_MIN_BYTES}"
            )));
        }
        if self.max_actions == 0 {
            return Err(ConfigError::Invalid("max_actions must be positive".into()));
        }
        if self.encode_buffer_bytes < ENCODE_BUFFER_MIN_SIZE {
            return Err(ConfigError::Invalid(format!(
                "encode_buffer_bytes must be at least {ENCODE_BUFFER_MIN_SIZE}"
            )));
        }
        if self.desirability.contains_key(&ActionType::Null)
            || self.variability_damper.contains_key(&ActionType::Null)
        {
            return Err(ConfigError::Invalid(
                "the null action type cannot be configured".into(),
            ));
        }
        if let Some((action_type, _)) = self.variability_damper.iter().find(|(_, d)| **d == 0) {
            return Err(ConfigError::Invalid(format!(
                "variability damper for {action_type} must be positive"
            )));
        }
        Ok(())
    }
}
