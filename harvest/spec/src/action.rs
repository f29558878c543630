//! Task categories and the states a task moves through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of action types, the NULL sentinel included.
pub const MAX_NUM_ACTION_TYPES: usize = 11;

/// Category of schedulable work.
///
/// Ordinal 0 is the NULL sentinel: it terminates ranked tables and is never
/// itself scheduled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActionType {
    /// Sentinel, never scheduled.
    #[default]
    Null = 0,
    /// Send queued data over the cellular link.
    Report,
    /// Fetch network time, then report.
    GetTimeAndReport,
    /// Read the humidity sensor.
    MeasureHumidity,
    /// Read the barometer.
    MeasureAtmosphericPressure,
    /// Read the temperature sensor.
    MeasureTemperature,
    /// Read visible light and UV.
    MeasureLight,
    /// Read the accelerometer.
    MeasureAcceleration,
    /// Acquire a GNSS fix.
    MeasurePosition,
    /// Read the magnetometer.
    MeasureMagnetic,
    /// Scan for BLE peripherals.
    MeasureBle,
}

impl ActionType {
    /// Every action type in ordinal order, NULL first.
    pub const ALL: [ActionType; MAX_NUM_ACTION_TYPES] = [
        ActionType::Null,
        ActionType::Report,
        ActionType::GetTimeAndReport,
        ActionType::MeasureHumidity,
        ActionType::MeasureAtmosphericPressure,
        ActionType::MeasureTemperature,
        ActionType::MeasureLight,
        ActionType::MeasureAcceleration,
        ActionType::MeasurePosition,
        ActionType::MeasureMagnetic,
        ActionType::MeasureBle,
    ];

    /// Action types that can be scheduled, i.e. all but NULL.
    pub fn schedulable() -> impl DoubleEndedIterator<Item = ActionType> + ExactSizeIterator + Clone {
        Self::ALL.into_iter().skip(1)
    }

    /// Ordinal, usable as a table index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Action type for an ordinal, `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// True for the NULL sentinel.
    pub fn is_null(self) -> bool {
        self == ActionType::Null
    }

    /// Stable snake_case name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            ActionType::Null => "null",
            ActionType::Report => "report",
            ActionType::GetTimeAndReport => "get_time_and_report",
            ActionType::MeasureHumidity => "measure_humidity",
            ActionType::MeasureAtmosphericPressure => "measure_atmospheric_pressure",
            ActionType::MeasureTemperature => "measure_temperature",
            ActionType::MeasureLight => "measure_light",
            ActionType::MeasureAcceleration => "measure_acceleration",
            ActionType::MeasurePosition => "measure_position",
            ActionType::MeasureMagnetic => "measure_magnetic",
            ActionType::MeasureBle => "measure_ble",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no action type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionType(pub String);

impl fmt::Display for UnknownActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action type `{}`", self.0)
    }
}

impl std::error::Error for UnknownActionType {}

impl FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownActionType(s.to_owned()))
    }
}

/// Lifecycle state of one action.
///
/// Collaborators set these directly through the registry; the only rules the
/// registry applies are which states may be recycled by a new action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    /// Slot unused.
    #[default]
    Null,
    /// Queued, not yet started.
    Requested,
    /// Being performed.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Ran but did not succeed.
    TriedAndFailed,
    /// Cancelled before finishing.
    Aborted,
}

impl ActionState {
    /// Requested or in progress.
    pub fn is_pending(self) -> bool {
        matches!(self, ActionState::Requested | ActionState::InProgress)
    }

    /// Completed or tried-and-failed: the action consumed energy and ran to an end.
    pub fn has_run(self) -> bool {
        matches!(self, ActionState::Completed | ActionState::TriedAndFailed)
    }

    /// Slots in these states are recycled before COMPLETED ones.
    pub fn is_free(self) -> bool {
        matches!(
            self,
            ActionState::Null | ActionState::Aborted | ActionState::TriedAndFailed
        )
    }

    /// Whether an action in this state takes part in ranking.
    pub fn is_ranked(self) -> bool {
        !self.is_free()
    }

    /// Upper-case name as used in debug dumps.
    pub fn name(self) -> &'static str {
        match self {
            ActionState::Null => "NULL",
            ActionState::Requested => "REQUESTED",
            ActionState::InProgress => "IN_PROGRESS",
            ActionState::Completed => "COMPLETED",
            ActionState::TriedAndFailed => "TRIED_AND_FAILED",
            ActionState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
