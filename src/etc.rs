//! Electronic-throttle safety monitor.
//!
//! Cross-checks the redundant pedal and throttle position sensor pairs on
//! a fixed 10 ms cadence. A disagreement only counts once it has persisted
//! for a configured number of consecutive ticks; a single in-tolerance
//! tick resets that disagreement's counter. When any counter reaches its
//! threshold the monitor trips a terminal latch and drives the
//! throttle-enable output off.
//!
//! # Ownership invariant
//!
//! The throttle-enable line is written exactly twice over the process
//! lifetime: once high at [`arm`](EtcMonitor::arm) during boot, once low
//! at the trip. No other code path in the crate holds the pin, so nothing
//! can re-enable a faulted throttle; clearing the latch requires a power
//! cycle.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::config::EtcConfig;
//! use rs_bcm::hal::MockPin;
//! use rs_bcm::{EtcMonitor, ThrottleSensors};
//!
//! let mut monitor = EtcMonitor::new(MockPin::new(), &EtcConfig::default());
//! monitor.arm().unwrap();
//! assert!(monitor.throttle_enabled());
//!
//! // Pedal sensors disagreeing by 50% for 10 consecutive ticks trips the latch
//! let fault = ThrottleSensors { apps1: 80, apps2: 30, tps1: 40, tps2: 40 };
//! for _ in 0..10 {
//!     monitor.tick(&fault).unwrap();
//! }
//! assert!(monitor.is_tripped());
//! assert!(!monitor.throttle_enabled());
//! ```

use crate::config::EtcConfig;
use crate::telemetry::ThrottleSensors;
use crate::traits::DigitalOutput;

/// Consecutive-disagreement counters, one per cross-check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultCounters {
    /// APPS1 vs APPS2 disagreement ticks.
    pub apps_vs_apps: u32,
    /// TPS1 vs TPS2 disagreement ticks.
    pub tps_vs_tps: u32,
    /// APPS1 vs TPS1 disagreement ticks (idle-gated).
    pub apps_vs_tps: u32,
}

/// The ETC safety monitor and the throttle-enable output it owns.
///
/// # Type Parameter
///
/// - `O`: the throttle-enable output ([`DigitalOutput`] trait)
#[derive(Debug)]
pub struct EtcMonitor<O: DigitalOutput> {
    enable: O,
    config: EtcConfig,
    counters: FaultCounters,
    armed: bool,
    tripped: bool,
}

impl<O: DigitalOutput> EtcMonitor<O> {
    /// Create a monitor. The enable line is not touched until
    /// [`arm`](Self::arm).
    pub fn new(enable: O, config: &EtcConfig) -> Self {
        Self {
            enable,
            config: *config,
            counters: FaultCounters::default(),
            armed: false,
            tripped: false,
        }
    }

    /// Drive the throttle-enable output high. Call once at boot.
    ///
    /// Subsequent calls are no-ops: the line is only ever written at arm
    /// and at trip.
    pub fn arm(&mut self) -> Result<(), O::Error> {
        if self.armed {
            return Ok(());
        }
        self.enable.set_high()?;
        self.armed = true;
        Ok(())
    }

    /// Run one 10 ms safety tick against the latest sensor values.
    ///
    /// Returns whether the latch is tripped after the tick. Once tripped,
    /// ticks return immediately without touching counters or the output;
    /// the fault is terminal, there is nothing left to measure.
    pub fn tick(&mut self, sensors: &ThrottleSensors) -> Result<bool, O::Error> {
        if self.tripped {
            return Ok(true);
        }

        let c = &self.config;

        self.counters.apps_vs_apps =
            bump(self.counters.apps_vs_apps, disagrees(sensors.apps1, sensors.apps2, c.apps_tolerance));
        self.counters.tps_vs_tps =
            bump(self.counters.tps_vs_tps, disagrees(sensors.tps1, sensors.tps2, c.tps_tolerance));

        // The pedal/throttle cross-check only arms off idle; closed-plate
        // sensor offset would otherwise trip it on a parked car.
        let off_idle =
            sensors.tps1 > c.idle_enable_threshold || sensors.tps2 > c.idle_enable_threshold;
        self.counters.apps_vs_tps = bump(
            self.counters.apps_vs_tps,
            off_idle && disagrees(sensors.apps1, sensors.tps1, c.cross_tolerance),
        );

        if self.counters.apps_vs_apps >= c.trip_ticks
            || self.counters.tps_vs_tps >= c.trip_ticks
            || self.counters.apps_vs_tps >= c.trip_ticks
        {
            log::warn!(
                "ETC latch tripped: counters {:?}, sensors {:?}",
                self.counters,
                sensors,
            );
            self.enable.set_low()?;
            self.tripped = true;
        }

        Ok(self.tripped)
    }

    /// Whether the latch has tripped.
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Whether the throttle-enable output is currently high.
    pub fn throttle_enabled(&self) -> bool {
        self.armed && !self.tripped
    }

    /// Current counter values.
    pub fn counters(&self) -> FaultCounters {
        self.counters
    }
}

fn disagrees(a: u8, b: u8, tolerance: u8) -> bool {
    a.abs_diff(b) >= tolerance
}

fn bump(counter: u32, faulted: bool) -> u32 {
    if faulted {
        counter.saturating_add(1)
    } else {
        0
    }
}
