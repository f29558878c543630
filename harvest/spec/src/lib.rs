//! Shared vocabulary for the energy-harvesting sensor node.
//!
//! Everything here is plain data: the fixed set of action types and states,
//! the measurement payloads a task can produce, the flags carried by stored
//! items and the constants both ends of the narrowband link agree on. The
//! stateful parts (arena, task pool, framing) live in `harvest-core`.
#![deny(missing_docs)]

pub mod action;
pub mod clock;
pub mod data;

pub use action::{ActionState, ActionType, MAX_NUM_ACTION_TYPES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use data::{
    Acceleration, AtmosphericPressure, Ble, Cellular, DataFlags, DataKind, EnergySource,
    Humidity, Light, Log, LogEntry, Magnetic, Measurement, Position, Statistics, Temperature,
    WakeUp, WakeUpCause, BLE_NAME_MAX_LENGTH, LOG_MAX_ENTRIES, MAX_NUM_DATA_KINDS,
};

/// Version of the uplink frame format, carried in every frame header.
pub const PROTOCOL_VERSION: u32 = 1;

/// Longest device name, in bytes, that frames and acknowledgements support.
pub const MAX_NAME_LENGTH: usize = 32;

/// Weight given to every action type until told otherwise.
pub const DESIRABILITY_DEFAULT: Desirability = 1;

/// Divisor applied to raw variability until told otherwise.
pub const VARIABILITY_DAMPER_DEFAULT: VariabilityDamper = 1;

/// Scheduling weight of an action type; zero switches the type off.
pub type Desirability = u32;

/// Per-type divisor normalizing measured variability.
pub type VariabilityDamper = u32;

/// Wall-clock UTC seconds.
pub type TimeUtc = i64;
