//! Thermal/operational state machine driving the fan and water pump.
//!
//! The controller maps connectivity facts and engine telemetry into one of
//! five states once per 1 Hz tick, then re-applies the state's output
//! duties idempotently. Two guards keep the outputs calm:
//!
//! - a **deadband** between the cold and hot thresholds, so a temperature
//!   hovering at the boundary cannot toggle the fan every tick
//! - a **minimum dwell** between transitions, so no pair of states can
//!   chatter faster than once per second (losing the bus overrides the
//!   dwell; Safety always wins immediately)
//!
//! Engine-off cooldown is continuous: while the engine is off, residual
//! heat above the cooldown trigger keeps both outputs at reduced duty and
//! the machine reports [`VehicleState::Cooldown`]. An earlier board
//! revision instead ran fixed-duration cooldown stages (fan 15 s, then
//! pump 60 s) as a blocking sequence; the continuous form was kept because
//! it cannot wedge the task mid-sequence.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::config::CoolingConfig;
//! use rs_bcm::hal::MockPwm;
//! use rs_bcm::{ConnectivityFacts, CoolingController, EngineTelemetry, VehicleState};
//!
//! let mut cooling = CoolingController::new(
//!     MockPwm::new(),
//!     MockPwm::new(),
//!     &CoolingConfig::default(),
//! );
//!
//! let facts = ConnectivityFacts::default();
//! let telemetry = EngineTelemetry { rpm: 4000, water_temp: 200.0 };
//!
//! let state = cooling.tick(&facts, &telemetry, 0).unwrap();
//! assert_eq!(state, VehicleState::HotRunning);
//! ```

use crate::config::{CoolingConfig, PWM_PERIOD_US};
use crate::telemetry::EngineTelemetry;
use crate::traits::PwmOutput;
use crate::watchdog::ConnectivityFacts;

/// Thermal/operational state of the vehicle.
///
/// Exactly one state is current at any instant; transitions are evaluated
/// once per tick by [`CoolingController::tick`], never concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VehicleState {
    /// Bus lost: assume the worst, run fan and pump at full active duty.
    Safety,
    /// Engine off, no residual heat: everything off.
    EngineOff,
    /// Engine off, residual heat: reduced-duty heat dissipation.
    Cooldown,
    /// Engine running below the hot threshold: pump only.
    ColdRunning,
    /// Engine running hot: pump and fan.
    HotRunning,
}

impl VehicleState {
    /// Returns the state as a lowercase string for logs and status output.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleState::Safety => "safety",
            VehicleState::EngineOff => "engine_off",
            VehicleState::Cooldown => "cooldown",
            VehicleState::ColdRunning => "cold_running",
            VehicleState::HotRunning => "hot_running",
        }
    }
}

/// The thermal state machine and its two PWM outputs.
///
/// # Type Parameter
///
/// - `P`: PWM output implementation used for both fan and pump
///   ([`PwmOutput`] trait)
///
/// The throttle-enable line is deliberately *not* driven here; it is
/// owned exclusively by [`EtcMonitor`](crate::EtcMonitor), which is the
/// only component allowed to touch it.
#[derive(Debug)]
pub struct CoolingController<P: PwmOutput> {
    fan: P,
    pump: P,
    config: CoolingConfig,
    state: VehicleState,
    last_transition_ms: Option<u64>,
}

impl<P: PwmOutput> CoolingController<P> {
    /// Create a controller in the boot default state (ColdRunning).
    pub fn new(fan: P, pump: P, config: &CoolingConfig) -> Self {
        Self {
            fan,
            pump,
            config: *config,
            state: VehicleState::ColdRunning,
            last_transition_ms: None,
        }
    }

    /// Configure the PWM carriers and park both outputs off.
    ///
    /// Call once at startup before the first tick.
    pub fn init(&mut self) -> Result<(), P::Error> {
        self.fan.set_period_us(PWM_PERIOD_US)?;
        self.pump.set_period_us(PWM_PERIOD_US)?;
        self.fan.off()?;
        self.pump.off()
    }

    /// Evaluate one transition and re-apply the output mapping.
    ///
    /// Returns the state in effect after the tick. Call at 1 Hz; the
    /// minimum dwell assumes ticks arrive no faster than the dwell
    /// window itself.
    pub fn tick(
        &mut self,
        facts: &ConnectivityFacts,
        telemetry: &EngineTelemetry,
        now_ms: u64,
    ) -> Result<VehicleState, P::Error> {
        let target = self.evaluate(facts, telemetry);

        if target != self.state {
            let dwell_elapsed = match self.last_transition_ms {
                None => true,
                Some(t) => now_ms.saturating_sub(t) >= self.config.min_dwell_ms,
            };

            // Safety preempts the dwell: a dead bus must not wait out a
            // chatter guard.
            if target == VehicleState::Safety || dwell_elapsed {
                log::info!(
                    "vehicle state {} -> {} (rpm={}, temp={:.1})",
                    self.state.as_str(),
                    target.as_str(),
                    telemetry.rpm,
                    telemetry.water_temp,
                );
                self.state = target;
                self.last_transition_ms = Some(now_ms);
            }
        }

        self.apply_outputs()?;
        Ok(self.state)
    }

    /// Current state.
    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Access the fan output (for inspection in tests).
    pub fn fan(&self) -> &P {
        &self.fan
    }

    /// Access the pump output (for inspection in tests).
    pub fn pump(&self) -> &P {
        &self.pump
    }

    fn evaluate(&self, facts: &ConnectivityFacts, telemetry: &EngineTelemetry) -> VehicleState {
        // Lost bus always wins.
        if !facts.bus_connected {
            return VehicleState::Safety;
        }

        // Engine provably off: cooldown is a continuous function of
        // residual heat.
        if !facts.ecu_connected && telemetry.rpm == 0 {
            return if telemetry.water_temp >= self.config.cooldown_trigger {
                VehicleState::Cooldown
            } else {
                VehicleState::EngineOff
            };
        }

        if telemetry.rpm > self.config.running_rpm {
            let hot_edge = self.config.warm_threshold + self.config.deadband;
            if telemetry.water_temp >= hot_edge {
                return VehicleState::HotRunning;
            }
            if telemetry.water_temp <= self.config.warm_threshold {
                return VehicleState::ColdRunning;
            }
            // Inside the deadband: hold the current running state.
            return match self.state {
                VehicleState::HotRunning => VehicleState::HotRunning,
                _ => VehicleState::ColdRunning,
            };
        }

        // Fail toward running-cool: the ColdRunning outputs are safe
        // whether or not the engine is actually turning.
        VehicleState::ColdRunning
    }

    /// Re-apply the output mapping for the current state.
    ///
    /// Idempotent; runs every tick so a glitched output self-heals.
    fn apply_outputs(&mut self) -> Result<(), P::Error> {
        let c = &self.config;
        let (fan_duty, pump_duty) = match self.state {
            VehicleState::Safety => (c.fan_active_duty, c.pump_active_duty),
            VehicleState::EngineOff => (0.0, 0.0),
            VehicleState::Cooldown => (c.fan_cooldown_duty, c.pump_cooldown_duty),
            VehicleState::ColdRunning => (0.0, c.pump_active_duty),
            VehicleState::HotRunning => (c.fan_active_duty, c.pump_active_duty),
        };
        self.fan.set_duty(fan_duty)?;
        self.pump.set_duty(pump_duty)
    }
}
