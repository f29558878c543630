//! The owning context: one store, one registry bound to it, one codec pass.
use std::sync::Arc;

use harvest_spec::Clock;
use parking_lot::Mutex;
use tracing::info;

use crate::codec::{decode_ack, Codec, Encoded};
use crate::config::NodeConfig;
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::registry::ActionRegistry;
use crate::store::DataStore;

/// A configured node core.
///
/// Lock order is registry before store; the codec's own lock is taken before
/// the store's and never together with the registry's.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    store: Arc<DataStore>,
    registry: ActionRegistry,
    codec: Mutex<Codec>,
}

impl Node {
    /// Validate `config` and build the context around it.
    pub fn new(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = Arc::new(DataStore::with_buffer(
            vec![0; config.arena_bytes],
            clock.clone(),
        ));
        let registry = ActionRegistry::with_capacity(config.max_actions, store.clone(), clock);
        for (&action_type, &desirability) in &config.desirability {
            registry.set_desirability(action_type, desirability);
        }
        for (&action_type, &damper) in &config.variability_damper {
            registry.set_variability_damper(action_type, damper);
        }
        let codec = Mutex::new(Codec::new(store.clone()));
        info!(
            device_id = %config.device_id,
            arena_bytes = config.arena_bytes,
            max_actions = config.max_actions,
            "node core ready"
        );
        Ok(Self {
            config,
            store,
            registry,
            codec,
        })
    }

    /// Configuration the node was built from.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The measurement store.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// The action registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// A zeroed buffer of the configured encode size.
    pub fn encode_buffer(&self) -> Vec<u8> {
        vec![0; self.config.encode_buffer_bytes]
    }

    /// Start a codec pass.
    pub fn prepare(&self) {
        self.codec.lock().prepare();
    }

    /// Encode the next frame of the pass under this node's device id.
    pub fn encode(&self, buf: &mut [u8]) -> Result<Encoded, EncodeError> {
        self.codec.lock().encode(&self.config.device_id, buf)
    }

    /// Free every item of the pass awaiting acknowledgement.
    pub fn ack_data(&self) -> usize {
        self.codec.lock().ack_data()
    }

    /// Free the items of one frame of the pass.
    pub fn ack_frame(&self, index: u32) -> usize {
        self.codec.lock().ack_frame(index)
    }

    /// Items of the pass awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.codec.lock().in_flight()
    }

    /// Parse an acknowledgement addressed to this node.
    pub fn decode_ack(&self, buf: &[u8]) -> Result<u32, DecodeError> {
        decode_ack(buf, &self.config.device_id)
    }
}
