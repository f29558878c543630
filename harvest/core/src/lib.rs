//! Decision and storage core of an energy-harvesting sensor node.
//!
//! Three parts share one bounded memory budget:
//!
//! - [`DataStore`]: an arena of measurement records with exact accounting,
//!   priority traversal and a per-kind `difference()` used to judge how
//!   variable a measurement is;
//! - [`ActionRegistry`]: a fixed pool of tasks and the ranking that decides
//!   which task type to run next;
//! - [`Codec`]: packs stored items into size-bounded uplink frames and frees
//!   them once acknowledged.
//!
//! [`Node`] wires the three together from a [`NodeConfig`]. The core does no
//! I/O; time comes from an injected [`Clock`](harvest_spec::Clock).
#![deny(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod node;
pub mod registry;
pub mod store;

pub use codec::{decode_ack, Codec, EncodeFlags, Encoded, ACK_INDEX_MAX, ENCODE_BUFFER_MIN_SIZE};
pub use config::{NodeConfig, ARENA_MIN_BYTES};
pub use error::{ConfigError, DecodeError, EncodeError, RegistryError, StoreError};
pub use handle::{ActionId, DataId};
pub use node::Node;
pub use registry::{Action, ActionRegistry, MAX_NUM_ACTIONS};
pub use store::{DataItem, DataStore, DATA_DEFAULT_ARENA_BYTES};
