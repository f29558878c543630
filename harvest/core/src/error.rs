//! Error surface of the node core.
use std::path::PathBuf;

use harvest_spec::DataKind;
use thiserror::Error;

/// Data store failures. Running out of arena space is not one of them: it is
/// reported as an empty allocation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Handle refers to an item that has been freed.
    #[error("stale data handle {0}")]
    StaleHandle(crate::DataId),
    /// `difference()` called on items of different kinds.
    #[error("cannot difference {a} against {b}")]
    KindMismatch {
        /// Kind of the first item.
        a: DataKind,
        /// Kind of the second item.
        b: DataKind,
    },
    /// A bounded field of the payload is over its limit.
    #[error("{0} payload exceeds its field limits")]
    PayloadTooLarge(DataKind),
    /// The payload could not be written to or read back from the arena.
    #[error("payload codec: {0}")]
    Payload(#[from] bincode::Error),
}

/// Action registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Handle refers to a slot that has since been reused or removed.
    #[error("stale action handle {0}")]
    StaleAction(crate::ActionId),
    /// Store failure while recording a measurement.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reasons an acknowledgement message is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer does not follow the acknowledgement grammar.
    #[error("not an acknowledgement message")]
    NotAckMsg,
    /// Well formed, but addressed to another device.
    #[error("acknowledgement is for another device")]
    NoNameMatch,
    /// The expected device id is itself unusable.
    #[error("expected device id is longer than the supported maximum")]
    BadParameter,
}

/// Frame encoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Device id is too long or contains characters a frame cannot carry.
    #[error("device id `{0}` cannot be carried in a frame")]
    DeviceId(String),
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Config text is not valid JSON for a `NodeConfig`.
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
