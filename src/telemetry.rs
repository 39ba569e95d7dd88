//! Decoded vehicle telemetry and observable state snapshots.
//!
//! The dispatcher is the only writer of [`EngineTelemetry`] and
//! [`ThrottleSensors`]; everything else reads. When the ECU watchdog
//! expires, the main-loop core zeroes the telemetry so stale values can
//! never be mistaken for fresh ones.

use crate::cooling::VehicleState;
use crate::watchdog::ConnectivityFacts;

/// Engine telemetry decoded from the ECU broadcast frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineTelemetry {
    /// Engine speed in revolutions per minute.
    pub rpm: u32,
    /// Water temperature in the profile's reporting unit.
    pub water_temp: f32,
}

impl EngineTelemetry {
    /// Zero all values.
    ///
    /// Called when the ECU watchdog expires: a dead ECU must read as
    /// "engine stopped, cold", not as whatever it last broadcast.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Redundant pedal and throttle position sensor values.
///
/// Percent-of-travel (0–100) as normalized by the upstream ECU. Values
/// are accepted as-is; only cross-consistency is monitored, range is not
/// validated here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleSensors {
    /// Accelerator pedal position sensor 1.
    pub apps1: u8,
    /// Accelerator pedal position sensor 2.
    pub apps2: u8,
    /// Throttle position sensor 1.
    pub tps1: u8,
    /// Throttle position sensor 2.
    pub tps2: u8,
}

/// Full observable-state snapshot.
///
/// Assembled by the shared-state layer for the status reporter, demos,
/// and tests. Plain data; producing one never blocks a control path.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BcmSnapshot {
    /// Current thermal/operational state.
    pub vehicle_state: VehicleState,
    /// Connectivity facts from the last watchdog tick.
    pub facts: ConnectivityFacts,
    /// Latest engine telemetry.
    pub telemetry: EngineTelemetry,
    /// Latest throttle sensor values.
    pub sensors: ThrottleSensors,
    /// Throttle-enable output state (armed and not tripped).
    pub throttle_enabled: bool,
    /// Whether the ETC latch has tripped.
    pub etc_tripped: bool,
    /// Whether the gearbox neutral switch is closed.
    pub in_neutral: bool,
}
