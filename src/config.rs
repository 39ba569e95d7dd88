//! Shared configuration for the BCM firmware core.
//!
//! Every tunable the control logic depends on lives here: watchdog
//! timeouts, the vendor CAN profile, cooling thresholds and duty cycles,
//! ETC fault tolerances, and shift pulse widths. Defaults match the
//! hardware the module was built for; override with the builder methods.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::config::{BcmConfig, CoolingConfig, WatchdogConfig};
//!
//! // Use defaults
//! let config = BcmConfig::default();
//!
//! // Or customize
//! let config = BcmConfig::default()
//!     .with_watchdog(WatchdogConfig::default().with_ecu_timeout_ms(1500))
//!     .with_cooling(CoolingConfig::default().with_warm_threshold(180.0));
//! ```

/// PWM carrier period for the fan and pump outputs, in microseconds.
pub const PWM_PERIOD_US: u32 = 100;

/// Fan duty cycle while actively cooling.
pub const FAN_ACTIVE_DUTY: f32 = 0.7;

/// Water pump duty cycle while the engine is running.
pub const PUMP_ACTIVE_DUTY: f32 = 0.9;

/// Fan duty cycle during residual-heat cooldown.
pub const FAN_COOLDOWN_DUTY: f32 = 0.4;

/// Water pump duty cycle during residual-heat cooldown.
pub const PUMP_COOLDOWN_DUTY: f32 = 0.5;

// ============================================================================
// Watchdog timeouts
// ============================================================================

/// Timeouts for the per-channel connectivity watchdogs.
///
/// Each channel is considered expired once *more* than its timeout has
/// elapsed since the last reset (exclusive boundary: an elapsed time equal
/// to the timeout still counts as connected).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchdogConfig {
    /// Milliseconds without an ECU heartbeat before the ECU is considered
    /// disconnected and telemetry is zeroed.
    pub ecu_timeout_ms: u64,
    /// Milliseconds without any bus traffic before the bus is considered
    /// dead and the state machine drops to Safety.
    pub can_timeout_ms: u64,
    /// Dead-man window for the momentary starter output.
    pub starter_timeout_ms: u64,
    /// Minimum interval between CAN controller resets (recovery rate limit).
    pub bus_reset_interval_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            ecu_timeout_ms: 2000,
            can_timeout_ms: 2000,
            starter_timeout_ms: 100,
            bus_reset_interval_ms: 1000,
        }
    }
}

impl WatchdogConfig {
    /// Set the ECU heartbeat timeout.
    pub fn with_ecu_timeout_ms(mut self, ms: u64) -> Self {
        self.ecu_timeout_ms = ms;
        self
    }

    /// Set the bus-traffic timeout.
    pub fn with_can_timeout_ms(mut self, ms: u64) -> Self {
        self.can_timeout_ms = ms;
        self
    }

    /// Set the starter dead-man window.
    pub fn with_starter_timeout_ms(mut self, ms: u64) -> Self {
        self.starter_timeout_ms = ms;
        self
    }

    /// Set the minimum interval between CAN controller resets.
    pub fn with_bus_reset_interval_ms(mut self, ms: u64) -> Self {
        self.bus_reset_interval_ms = ms;
        self
    }
}

// ============================================================================
// CAN vendor profile
// ============================================================================

/// Unit the decoded water temperature is reported in.
///
/// The ECU transmits deci-degrees Celsius on the wire; a Fahrenheit
/// profile converts after the ÷10 scaling so thresholds in
/// [`CoolingConfig`] can be written in the unit the team actually tunes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TemperatureUnit {
    /// Report the wire value as-is (degrees Celsius).
    Celsius,
    /// Convert to degrees Fahrenheit after decode.
    #[default]
    Fahrenheit,
}

/// How ECU liveness is proven.
///
/// Older ECU firmware emitted a dedicated heartbeat frame; newer firmware
/// lets the RPM broadcast double as the heartbeat. Both designs exist in
/// the field, so this is a profile choice rather than a hard-coded rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Liveness {
    /// Only the dedicated heartbeat ID feeds the ECU watchdog.
    DedicatedHeartbeat,
    /// Any recognized ECU frame (RPM, temperature, throttle sensors)
    /// feeds the ECU watchdog.
    #[default]
    AnyRecognizedFrame,
}

/// Vendor-specific CAN frame IDs and decode options.
///
/// Defaults match the MoTeC-style broadcast set the module ships against.
/// All IDs are raw 29-bit extended identifiers.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanProfile {
    /// Dedicated ECU heartbeat frame ID.
    pub heartbeat_id: u32,
    /// Engine RPM frame ID (bytes 0..2, little-endian).
    pub rpm_id: u32,
    /// Water temperature frame ID (bytes 4..6, little-endian, signed, ÷10).
    pub water_temp_id: u32,
    /// Throttle sensor frame ID (bytes 0..4 = APPS1, APPS2, TPS1, TPS2).
    pub throttle_id: u32,
    /// Steering-wheel command frame ID (byte 0 = shift command code).
    pub steering_id: u32,
    /// Outbound status frame ID.
    pub status_id: u32,
    /// Reported temperature unit.
    pub temperature_unit: TemperatureUnit,
    /// ECU liveness policy.
    pub liveness: Liveness,
}

impl Default for CanProfile {
    fn default() -> Self {
        Self {
            heartbeat_id: 0x0CFF_F048,
            rpm_id: 0x0CFF_F048,
            water_temp_id: 0x0CFF_F548,
            throttle_id: 0x0CFF_F648,
            steering_id: 0x0000_0000,
            status_id: 0x0CFF_FB48,
            temperature_unit: TemperatureUnit::default(),
            liveness: Liveness::default(),
        }
    }
}

impl CanProfile {
    /// Set the dedicated heartbeat frame ID.
    pub fn with_heartbeat_id(mut self, id: u32) -> Self {
        self.heartbeat_id = id;
        self
    }

    /// Set the RPM frame ID.
    pub fn with_rpm_id(mut self, id: u32) -> Self {
        self.rpm_id = id;
        self
    }

    /// Set the water temperature frame ID.
    pub fn with_water_temp_id(mut self, id: u32) -> Self {
        self.water_temp_id = id;
        self
    }

    /// Set the throttle sensor frame ID.
    pub fn with_throttle_id(mut self, id: u32) -> Self {
        self.throttle_id = id;
        self
    }

    /// Set the steering-wheel command frame ID.
    pub fn with_steering_id(mut self, id: u32) -> Self {
        self.steering_id = id;
        self
    }

    /// Set the outbound status frame ID.
    pub fn with_status_id(mut self, id: u32) -> Self {
        self.status_id = id;
        self
    }

    /// Set the reported temperature unit.
    pub fn with_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    /// Set the ECU liveness policy.
    pub fn with_liveness(mut self, liveness: Liveness) -> Self {
        self.liveness = liveness;
        self
    }
}

// ============================================================================
// Cooling
// ============================================================================

/// Thresholds and duty cycles for the thermal state machine.
///
/// `warm_threshold` and `deadband` define the hysteresis window between
/// ColdRunning and HotRunning: the fan turns on at
/// `warm_threshold + deadband` and back off only once the temperature
/// drops to `warm_threshold`. Temperatures are in the unit selected by
/// [`CanProfile::temperature_unit`].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoolingConfig {
    /// Lower edge of the hot/cold hysteresis window.
    pub warm_threshold: f32,
    /// Width of the hysteresis window.
    pub deadband: f32,
    /// Residual-heat temperature above which the engine-off cooldown runs.
    pub cooldown_trigger: f32,
    /// RPM above which the engine counts as running.
    pub running_rpm: u32,
    /// Minimum time between state transitions (chatter guard).
    pub min_dwell_ms: u64,
    /// Fan duty while actively cooling.
    pub fan_active_duty: f32,
    /// Pump duty while the engine is running.
    pub pump_active_duty: f32,
    /// Fan duty during cooldown.
    pub fan_cooldown_duty: f32,
    /// Pump duty during cooldown.
    pub pump_cooldown_duty: f32,
}

impl Default for CoolingConfig {
    fn default() -> Self {
        Self {
            warm_threshold: 175.0,
            deadband: 20.0,
            cooldown_trigger: 150.0,
            running_rpm: 1000,
            min_dwell_ms: 1000,
            fan_active_duty: FAN_ACTIVE_DUTY,
            pump_active_duty: PUMP_ACTIVE_DUTY,
            fan_cooldown_duty: FAN_COOLDOWN_DUTY,
            pump_cooldown_duty: PUMP_COOLDOWN_DUTY,
        }
    }
}

impl CoolingConfig {
    /// Set the lower edge of the hot/cold hysteresis window.
    pub fn with_warm_threshold(mut self, degrees: f32) -> Self {
        self.warm_threshold = degrees;
        self
    }

    /// Set the hysteresis window width.
    pub fn with_deadband(mut self, degrees: f32) -> Self {
        self.deadband = degrees;
        self
    }

    /// Set the cooldown trigger temperature.
    pub fn with_cooldown_trigger(mut self, degrees: f32) -> Self {
        self.cooldown_trigger = degrees;
        self
    }

    /// Set the engine-running RPM threshold.
    pub fn with_running_rpm(mut self, rpm: u32) -> Self {
        self.running_rpm = rpm;
        self
    }

    /// Set the minimum dwell between state transitions.
    pub fn with_min_dwell_ms(mut self, ms: u64) -> Self {
        self.min_dwell_ms = ms;
        self
    }
}

// ============================================================================
// ETC safety monitor
// ============================================================================

/// Tolerances and trip timing for the ETC safety monitor.
///
/// All sensor values are percent-of-travel (0–100) as normalized by the
/// upstream ECU. A disagreement must persist for `trip_ticks` consecutive
/// 10 ms ticks before the latch fires; with the default of 10 ticks that
/// is a 100 ms persistent fault.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EtcConfig {
    /// Maximum allowed |APPS1 − APPS2| before the tick counts as a fault.
    pub apps_tolerance: u8,
    /// Maximum allowed |TPS1 − TPS2| before the tick counts as a fault.
    pub tps_tolerance: u8,
    /// Maximum allowed |APPS1 − TPS1| before the tick counts as a fault.
    pub cross_tolerance: u8,
    /// TPS percent above which the pedal/throttle cross-check is armed.
    /// Suppresses false trips from sensor offset at closed throttle.
    pub idle_enable_threshold: u8,
    /// Consecutive faulted ticks required to trip the latch.
    pub trip_ticks: u32,
}

impl Default for EtcConfig {
    fn default() -> Self {
        Self {
            apps_tolerance: 10,
            tps_tolerance: 10,
            cross_tolerance: 15,
            idle_enable_threshold: 5,
            trip_ticks: 10,
        }
    }
}

impl EtcConfig {
    /// Set the APPS pair tolerance.
    pub fn with_apps_tolerance(mut self, percent: u8) -> Self {
        self.apps_tolerance = percent;
        self
    }

    /// Set the TPS pair tolerance.
    pub fn with_tps_tolerance(mut self, percent: u8) -> Self {
        self.tps_tolerance = percent;
        self
    }

    /// Set the pedal/throttle cross-check tolerance.
    pub fn with_cross_tolerance(mut self, percent: u8) -> Self {
        self.cross_tolerance = percent;
        self
    }

    /// Set the idle gate for the cross-check.
    pub fn with_idle_enable_threshold(mut self, percent: u8) -> Self {
        self.idle_enable_threshold = percent;
        self
    }

    /// Set the consecutive-tick trip threshold.
    pub fn with_trip_ticks(mut self, ticks: u32) -> Self {
        self.trip_ticks = ticks;
        self
    }
}

// ============================================================================
// Shift sequencing
// ============================================================================

/// Pulse widths for the shift actuator sequences, in milliseconds.
///
/// The interlock delay separates the spark-cut edge from the solenoid
/// edges on both sides of a pulse, so the ignition is already cut when
/// the dog rings unload and stays cut until the pulse has fully ended.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftConfig {
    /// Gap between the spark-cut edge and the adjacent solenoid edge.
    pub interlock_delay_ms: u32,
    /// Upshift solenoid hold time.
    pub upshift_pulse_ms: u32,
    /// Downshift solenoid hold time (typically longer than upshift).
    pub downshift_pulse_ms: u32,
    /// Half-shift: delay between the upshift and downshift solenoid starts.
    pub halfshift_offset_ms: u32,
    /// Half-shift: hold time after both solenoids are on.
    pub halfshift_hold_ms: u32,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            interlock_delay_ms: 10,
            upshift_pulse_ms: 40,
            downshift_pulse_ms: 80,
            halfshift_offset_ms: 10,
            halfshift_hold_ms: 40,
        }
    }
}

impl ShiftConfig {
    /// Set the spark-cut interlock delay.
    pub fn with_interlock_delay_ms(mut self, ms: u32) -> Self {
        self.interlock_delay_ms = ms;
        self
    }

    /// Set the upshift pulse width.
    pub fn with_upshift_pulse_ms(mut self, ms: u32) -> Self {
        self.upshift_pulse_ms = ms;
        self
    }

    /// Set the downshift pulse width.
    pub fn with_downshift_pulse_ms(mut self, ms: u32) -> Self {
        self.downshift_pulse_ms = ms;
        self
    }
}

// ============================================================================
// Main config
// ============================================================================

/// Complete BCM configuration.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BcmConfig {
    /// Connectivity watchdog timeouts.
    pub watchdog: WatchdogConfig,
    /// Vendor CAN profile.
    pub can: CanProfile,
    /// Thermal state machine tuning.
    pub cooling: CoolingConfig,
    /// ETC safety monitor tuning.
    pub etc: EtcConfig,
    /// Shift pulse timing.
    pub shift: ShiftConfig,
}

impl BcmConfig {
    /// Replace the watchdog configuration.
    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Replace the CAN profile.
    pub fn with_can(mut self, can: CanProfile) -> Self {
        self.can = can;
        self
    }

    /// Replace the cooling configuration.
    pub fn with_cooling(mut self, cooling: CoolingConfig) -> Self {
        self.cooling = cooling;
        self
    }

    /// Replace the ETC configuration.
    pub fn with_etc(mut self, etc: EtcConfig) -> Self {
        self.etc = etc;
        self
    }

    /// Replace the shift configuration.
    pub fn with_shift(mut self, shift: ShiftConfig) -> Self {
        self.shift = shift;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = BcmConfig::default();
        assert!(config.watchdog.ecu_timeout_ms > 0);
        assert!(config.cooling.deadband > 0.0);
        assert!(config.cooling.fan_active_duty <= 1.0);
        assert!(config.etc.trip_ticks > 0);
        assert!(config.shift.downshift_pulse_ms >= config.shift.upshift_pulse_ms);
    }

    #[test]
    fn builders_replace_fields() {
        let config = BcmConfig::default()
            .with_watchdog(WatchdogConfig::default().with_ecu_timeout_ms(250))
            .with_cooling(
                CoolingConfig::default()
                    .with_warm_threshold(80.0)
                    .with_deadband(5.0),
            )
            .with_etc(EtcConfig::default().with_trip_ticks(20));

        assert_eq!(config.watchdog.ecu_timeout_ms, 250);
        assert_eq!(config.cooling.warm_threshold, 80.0);
        assert_eq!(config.cooling.deadband, 5.0);
        assert_eq!(config.etc.trip_ticks, 20);
    }

    #[test]
    fn default_profile_rpm_doubles_as_heartbeat() {
        let profile = CanProfile::default();
        assert_eq!(profile.heartbeat_id, profile.rpm_id);
        assert_eq!(profile.liveness, Liveness::AnyRecognizedFrame);
    }
}
