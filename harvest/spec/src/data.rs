//! Measurement payloads and the flags stored alongside them.
//!
//! A [`Measurement`] is a tagged sum over the fixed set of things a task can
//! record; each variant carries only its own fields so that the store copies
//! no more bytes than the variant needs.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Number of measurement kinds.
pub const MAX_NUM_DATA_KINDS: usize = 13;

/// Longest BLE peripheral name kept, in bytes.
pub const BLE_NAME_MAX_LENGTH: usize = 31;

/// Most entries one log record may carry.
pub const LOG_MAX_ENTRIES: usize = 8;

/// Delivery flags of a stored item.
///
/// Ordering of stored items compares the raw value, so items with more
/// urgent flags set sort first. Unknown bits are dropped on deserialization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct DataFlags(u8);

impl DataFlags {
    /// No flags.
    pub const NONE: DataFlags = DataFlags(0);
    /// Keep the item until the server acknowledges the frame carrying it.
    pub const REQUIRES_ACK: DataFlags = DataFlags(0x01);
    /// Deliver ahead of ordinary items.
    pub const SEND_NOW: DataFlags = DataFlags(0x02);

    /// Build from raw bits, dropping unknown ones.
    pub fn from_bits_truncate(bits: u8) -> Self {
        DataFlags(bits & (Self::REQUIRES_ACK.0 | Self::SEND_NOW.0))
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub fn contains(self, other: DataFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Shorthand for `contains(REQUIRES_ACK)`.
    pub fn requires_ack(self) -> bool {
        self.contains(Self::REQUIRES_ACK)
    }
}

impl From<u8> for DataFlags {
    fn from(bits: u8) -> Self {
        DataFlags::from_bits_truncate(bits)
    }
}

impl From<DataFlags> for u8 {
    fn from(flags: DataFlags) -> u8 {
        flags.bits()
    }
}

impl BitOr for DataFlags {
    type Output = DataFlags;

    fn bitor(self, rhs: DataFlags) -> DataFlags {
        DataFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for DataFlags {
    fn bitor_assign(&mut self, rhs: DataFlags) {
        self.0 |= rhs.0;
    }
}

/// Kind of a stored measurement, i.e. the tag of [`Measurement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Why the node woke up.
    WakeUp,
    /// Which harvester is feeding the node.
    EnergySource,
    /// Running counters.
    Statistics,
    /// A batch of event-log entries.
    Log,
    /// Radio conditions at the last report.
    Cellular,
    /// Relative humidity.
    Humidity,
    /// Barometric pressure.
    AtmosphericPressure,
    /// Temperature.
    Temperature,
    /// Visible light and UV index.
    Light,
    /// Three-axis acceleration.
    Acceleration,
    /// GNSS fix.
    Position,
    /// Magnetic field strength.
    Magnetic,
    /// A BLE peripheral's report.
    Ble,
}

impl DataKind {
    /// Every kind in ordinal order.
    pub const ALL: [DataKind; MAX_NUM_DATA_KINDS] = [
        DataKind::WakeUp,
        DataKind::EnergySource,
        DataKind::Statistics,
        DataKind::Log,
        DataKind::Cellular,
        DataKind::Humidity,
        DataKind::AtmosphericPressure,
        DataKind::Temperature,
        DataKind::Light,
        DataKind::Acceleration,
        DataKind::Position,
        DataKind::Magnetic,
        DataKind::Ble,
    ];

    /// Ordinal, usable as a table index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Three-letter tag used for this kind in uplink frames.
    pub fn tag(self) -> &'static str {
        match self {
            DataKind::WakeUp => "wkp",
            DataKind::EnergySource => "nrg",
            DataKind::Statistics => "sts",
            DataKind::Log => "log",
            DataKind::Cellular => "cel",
            DataKind::Humidity => "hum",
            DataKind::AtmosphericPressure => "prs",
            DataKind::Temperature => "tmp",
            DataKind::Light => "lgt",
            DataKind::Acceleration => "acc",
            DataKind::Position => "pos",
            DataKind::Magnetic => "mag",
            DataKind::Ble => "ble",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reason for the most recent wake-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeUpCause {
    /// Cold start.
    #[default]
    PowerOn,
    /// Periodic timer.
    Rtc,
    /// Accelerometer interrupt.
    Acceleration,
    /// Magnetometer interrupt.
    Magnetic,
    /// Watchdog reset.
    Watchdog,
}

impl WakeUpCause {
    /// Wire code of the cause.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Wake-up record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeUp {
    /// What woke the node.
    pub reason: WakeUpCause,
}

/// Energy source record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergySource {
    /// Harvester number in use.
    pub source: u8,
}

/// Running counters since boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Seconds spent asleep.
    pub sleep_time_seconds: u32,
    /// Number of wake-ups.
    pub wake_ups: u32,
    /// Number of actions performed.
    pub actions_run: u32,
    /// Energy consumed, nanowatt-hours.
    pub energy_nwh: u64,
    /// Cellular connections made.
    pub cellular_connects: u32,
    /// Bytes transmitted.
    pub cellular_bytes_tx: u32,
    /// Bytes received.
    pub cellular_bytes_rx: u32,
}

/// One event-log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Seconds since boot.
    pub timestamp: u32,
    /// Event code.
    pub event: u32,
    /// Event parameter.
    pub parameter: u32,
}

/// A batch of event-log entries, at most [`LOG_MAX_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Entries, oldest first.
    pub entries: Vec<LogEntry>,
}

/// Cellular radio conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cellular {
    /// Reference signal received power, dBm.
    pub rsrp_dbm: i32,
    /// Received signal strength, dBm.
    pub rssi_dbm: i32,
    /// Reference signal received quality, dB.
    pub rsrq_db: i32,
    /// Signal to noise ratio, dB.
    pub snr_db: i32,
    /// Coverage enhancement level.
    pub ecl: i32,
    /// Serving cell identity.
    pub physical_cell_id: i32,
    /// Transmit power, dBm.
    pub transmit_power_dbm: i32,
    /// Channel number.
    pub earfcn: i32,
}

/// Relative humidity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Humidity {
    /// Percent, 0 to 100.
    pub percentage: u8,
}

/// Barometric pressure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmosphericPressure {
    /// Pascals times 100.
    pub pascal_x100: u32,
}

/// Temperature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    /// Degrees Celsius times 100.
    pub c_x100: i32,
}

/// Light level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    /// Illuminance, lux.
    pub lux: i32,
    /// UV index times 1000.
    pub uv_index_x1000: i32,
}

/// Three-axis acceleration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceleration {
    /// X axis, g times 1000.
    pub x_g_x1000: i32,
    /// Y axis, g times 1000.
    pub y_g_x1000: i32,
    /// Z axis, g times 1000.
    pub z_g_x1000: i32,
}

/// GNSS fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude, degrees times 10^7.
    pub latitude_x10e7: i32,
    /// Longitude, degrees times 10^7.
    pub longitude_x10e7: i32,
    /// Horizontal accuracy radius, metres.
    pub radius_metres: i32,
    /// Altitude, metres.
    pub altitude_metres: i32,
    /// Ground speed, metres per second.
    pub speed_mps: u8,
}

/// Magnetic field strength.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magnetic {
    /// Teslas times 1000.
    pub tesla_x1000: u32,
}

/// Report from a BLE peripheral.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ble {
    /// Advertised name, at most [`BLE_NAME_MAX_LENGTH`] bytes.
    pub name: String,
    /// X axis, g times 1000.
    pub x_g_x1000: i32,
    /// Y axis, g times 1000.
    pub y_g_x1000: i32,
    /// Z axis, g times 1000.
    pub z_g_x1000: i32,
    /// Peripheral battery, percent.
    pub battery_percentage: u8,
}

/// One measurement payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    /// See [`WakeUp`].
    WakeUp(WakeUp),
    /// See [`EnergySource`].
    EnergySource(EnergySource),
    /// See [`Statistics`].
    Statistics(Statistics),
    /// See [`Log`].
    Log(Log),
    /// See [`Cellular`].
    Cellular(Cellular),
    /// See [`Humidity`].
    Humidity(Humidity),
    /// See [`AtmosphericPressure`].
    AtmosphericPressure(AtmosphericPressure),
    /// See [`Temperature`].
    Temperature(Temperature),
    /// See [`Light`].
    Light(Light),
    /// See [`Acceleration`].
    Acceleration(Acceleration),
    /// See [`Position`].
    Position(Position),
    /// See [`Magnetic`].
    Magnetic(Magnetic),
    /// See [`Ble`].
    Ble(Ble),
}

impl Measurement {
    /// The variant's kind.
    pub fn kind(&self) -> DataKind {
        match self {
            Measurement::WakeUp(_) => DataKind::WakeUp,
            Measurement::EnergySource(_) => DataKind::EnergySource,
            Measurement::Statistics(_) => DataKind::Statistics,
            Measurement::Log(_) => DataKind::Log,
            Measurement::Cellular(_) => DataKind::Cellular,
            Measurement::Humidity(_) => DataKind::Humidity,
            Measurement::AtmosphericPressure(_) => DataKind::AtmosphericPressure,
            Measurement::Temperature(_) => DataKind::Temperature,
            Measurement::Light(_) => DataKind::Light,
            Measurement::Acceleration(_) => DataKind::Acceleration,
            Measurement::Position(_) => DataKind::Position,
            Measurement::Magnetic(_) => DataKind::Magnetic,
            Measurement::Ble(_) => DataKind::Ble,
        }
    }

    /// The single field chosen to stand for this kind's variability.
    ///
    /// Wake-up reasons are categorical and always yield 0.
    pub fn representative(&self) -> i64 {
        match self {
            Measurement::WakeUp(_) => 0,
            Measurement::EnergySource(m) => i64::from(m.source),
            Measurement::Statistics(m) => i64::try_from(m.energy_nwh).unwrap_or(i64::MAX),
            Measurement::Log(m) => m.entries.len() as i64,
            Measurement::Cellular(m) => i64::from(m.rsrp_dbm),
            Measurement::Humidity(m) => i64::from(m.percentage),
            Measurement::AtmosphericPressure(m) => i64::from(m.pascal_x100),
            Measurement::Temperature(m) => i64::from(m.c_x100),
            Measurement::Light(m) => i64::from(m.lux),
            Measurement::Acceleration(m) => i64::from(m.x_g_x1000),
            Measurement::Position(m) => i64::from(m.radius_metres),
            Measurement::Magnetic(m) => i64::from(m.tesla_x1000),
            Measurement::Ble(m) => i64::from(m.battery_percentage),
        }
    }

    /// False when a variable-length field exceeds its bound.
    pub fn within_limits(&self) -> bool {
        match self {
            Measurement::Ble(m) => m.name.len() <= BLE_NAME_MAX_LENGTH,
            Measurement::Log(m) => m.entries.len() <= LOG_MAX_ENTRIES,
            _ => true,
        }
    }
}
