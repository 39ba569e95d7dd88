//! Timeout monitor: per-channel watchdogs deriving connectivity facts.
//!
//! Each channel records the timestamp of its last triggering event; the
//! monitor compares elapsed time against the configured timeout on every
//! tick. The monitor cannot fail: it only reports stale facts, and the
//! owners of downstream state (telemetry, outputs) act on those facts at
//! their own call sites.
//!
//! # Expiry boundary
//!
//! A channel is expired iff strictly *more* than its timeout has elapsed:
//! at exactly `timeout` milliseconds the channel still counts as alive.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::{TimeoutMonitor, WatchdogChannel, WatchdogConfig};
//!
//! let config = WatchdogConfig::default(); // 2000 ms ECU timeout
//! let mut monitor = TimeoutMonitor::new(&config, 0);
//!
//! monitor.tick(2000);
//! assert!(monitor.facts().ecu_connected); // boundary: still alive
//!
//! monitor.tick(2001);
//! assert!(!monitor.facts().ecu_connected);
//!
//! monitor.reset(WatchdogChannel::EcuHeartbeat, 2001);
//! monitor.tick(2002);
//! assert!(monitor.facts().ecu_connected);
//! ```

use crate::config::WatchdogConfig;

/// One watchdog channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogChannel {
    /// ECU heartbeat traffic.
    EcuHeartbeat,
    /// Any bus traffic.
    BusTraffic,
    /// Momentary starter activation (dead-man timer).
    StarterPulse,
    /// CAN controller reset rate limiter.
    BusReset,
}

/// Connectivity facts derived from the watchdog channels.
///
/// Recomputed by [`TimeoutMonitor::tick`]; read by the state machine and
/// the main loop. At boot all channels count as freshly reset, so the
/// facts start out optimistic and decay to disconnected if no traffic
/// arrives within the timeouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectivityFacts {
    /// The ECU heartbeat is current.
    pub ecu_connected: bool,
    /// Some bus traffic arrived within the timeout.
    pub bus_connected: bool,
    /// The engine is presumed running (tracks `ecu_connected`).
    pub engine_running: bool,
}

impl Default for ConnectivityFacts {
    fn default() -> Self {
        Self {
            ecu_connected: true,
            bus_connected: true,
            engine_running: true,
        }
    }
}

/// Per-channel elapsed-time watchdogs.
///
/// Timestamps are caller-supplied monotonic milliseconds; the monitor
/// never reads a clock itself, which keeps every timing property unit
/// testable with literal times.
#[derive(Debug)]
pub struct TimeoutMonitor {
    config: WatchdogConfig,
    ecu_last_ms: u64,
    bus_last_ms: u64,
    /// `Some` while the starter output is energized.
    starter_armed_ms: Option<u64>,
    /// `None` until the first controller reset.
    bus_reset_last_ms: Option<u64>,
    facts: ConnectivityFacts,
}

impl TimeoutMonitor {
    /// Create a monitor with every channel freshly reset at `now_ms`.
    pub fn new(config: &WatchdogConfig, now_ms: u64) -> Self {
        Self {
            config: *config,
            ecu_last_ms: now_ms,
            bus_last_ms: now_ms,
            starter_armed_ms: None,
            bus_reset_last_ms: None,
            facts: ConnectivityFacts::default(),
        }
    }

    /// Zero one channel's elapsed time.
    ///
    /// Called by the dispatcher on the matching event: heartbeat frames
    /// reset [`EcuHeartbeat`], every received frame resets [`BusTraffic`],
    /// energizing the starter resets [`StarterPulse`], and a controller
    /// reset restarts [`BusReset`].
    ///
    /// [`EcuHeartbeat`]: WatchdogChannel::EcuHeartbeat
    /// [`BusTraffic`]: WatchdogChannel::BusTraffic
    /// [`StarterPulse`]: WatchdogChannel::StarterPulse
    /// [`BusReset`]: WatchdogChannel::BusReset
    pub fn reset(&mut self, channel: WatchdogChannel, now_ms: u64) {
        match channel {
            WatchdogChannel::EcuHeartbeat => self.ecu_last_ms = now_ms,
            WatchdogChannel::BusTraffic => self.bus_last_ms = now_ms,
            WatchdogChannel::StarterPulse => self.starter_armed_ms = Some(now_ms),
            WatchdogChannel::BusReset => self.bus_reset_last_ms = Some(now_ms),
        }
    }

    /// Recompute connectivity facts at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> ConnectivityFacts {
        let ecu_alive = !expired(self.ecu_last_ms, now_ms, self.config.ecu_timeout_ms);
        self.facts = ConnectivityFacts {
            ecu_connected: ecu_alive,
            bus_connected: !expired(self.bus_last_ms, now_ms, self.config.can_timeout_ms),
            engine_running: ecu_alive,
        };
        self.facts
    }

    /// Facts from the most recent tick.
    pub fn facts(&self) -> ConnectivityFacts {
        self.facts
    }

    /// One-shot starter dead-man check.
    ///
    /// Returns true exactly once per activation, when the starter has been
    /// energized for longer than the dead-man window; the channel then
    /// disarms until the next [`reset`](Self::reset).
    pub fn starter_expired(&mut self, now_ms: u64) -> bool {
        match self.starter_armed_ms {
            Some(armed) if expired(armed, now_ms, self.config.starter_timeout_ms) => {
                self.starter_armed_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Whether the recovery policy may reset the CAN controller.
    ///
    /// Always true before the first reset; afterwards true once the
    /// configured interval has fully elapsed.
    pub fn bus_reset_allowed(&self, now_ms: u64) -> bool {
        match self.bus_reset_last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.bus_reset_interval_ms,
        }
    }
}

/// Exclusive expiry: elapsed time strictly greater than the timeout.
fn expired(last_ms: u64, now_ms: u64, timeout_ms: u64) -> bool {
    now_ms.saturating_sub(last_ms) > timeout_ms
}
