//! CAN frame decode and the bus-error-recovery policy.
//!
//! [`CanDispatcher::poll`] is the body of the main loop's bus work: it
//! first applies the recovery policy (controller reset when the error
//! counters run high, rate limited to once per second), then drains at
//! most one frame, feeds the liveness watchdogs, and decodes the frame
//! into typed updates.
//!
//! Two liveness rules are deliberate:
//!
//! - The *hardware* watchdog is kicked only on actual traffic. An idle bus
//!   therefore ends in a hardware reset, coupling "the firmware is alive"
//!   to "the bus is alive".
//! - ECU liveness depends on the profile's [`Liveness`] policy: either
//!   only the dedicated heartbeat ID counts, or any recognized ECU frame
//!   does.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::config::CanProfile;
//! use rs_bcm::{CanDispatcher, CanFrame, Decoded};
//!
//! let dispatcher = CanDispatcher::new(&CanProfile::default());
//!
//! // Raw 400 (0x0190) decodes to 40.0 °C, reported as 104 °F by default
//! let frame = CanFrame::new(0x0CFF_F548, &[0, 0, 0, 0, 0x90, 0x01]).unwrap();
//! assert_eq!(dispatcher.decode(&frame), Decoded::WaterTemp(104.0));
//! ```

use crate::config::{CanProfile, Liveness, TemperatureUnit};
use crate::shift::ShiftCommand;
use crate::telemetry::{EngineTelemetry, ThrottleSensors};
use crate::traits::{CanBus, CanFrame, WatchdogKick};
use crate::watchdog::{TimeoutMonitor, WatchdogChannel};

/// Error count above which the recovery policy resets the controller.
pub const BUS_ERROR_FAULT_THRESHOLD: u8 = 5;

/// A frame decoded against the vendor profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoded {
    /// Dedicated ECU heartbeat; carries no data.
    Heartbeat,
    /// Engine speed in RPM.
    Rpm(u32),
    /// Water temperature in the profile's reporting unit.
    WaterTemp(f32),
    /// Redundant pedal/throttle sensor values.
    Throttle(ThrottleSensors),
    /// Steering-wheel shift request.
    Shift(ShiftCommand),
    /// Unknown ID, short payload, or unrecognized command byte.
    Ignored,
}

/// Frame decoder plus the recovery policy.
#[derive(Clone, Debug)]
pub struct CanDispatcher {
    profile: CanProfile,
}

impl CanDispatcher {
    /// Create a dispatcher for the given vendor profile.
    pub fn new(profile: &CanProfile) -> Self {
        Self { profile: *profile }
    }

    /// The profile this dispatcher decodes against.
    pub fn profile(&self) -> &CanProfile {
        &self.profile
    }

    /// Decode one frame. Pure; no side effects.
    pub fn decode(&self, frame: &CanFrame) -> Decoded {
        let p = &self.profile;
        let d = &frame.data;

        if frame.id == p.rpm_id && d.len() >= 2 {
            return Decoded::Rpm(u32::from(u16::from_le_bytes([d[0], d[1]])));
        }
        if frame.id == p.heartbeat_id {
            return Decoded::Heartbeat;
        }
        if frame.id == p.water_temp_id && d.len() >= 6 {
            return Decoded::WaterTemp(self.decode_temperature([d[4], d[5]]));
        }
        if frame.id == p.throttle_id && d.len() >= 4 {
            return Decoded::Throttle(ThrottleSensors {
                apps1: d[0],
                apps2: d[1],
                tps1: d[2],
                tps2: d[3],
            });
        }
        if frame.id == p.steering_id && !d.is_empty() {
            return match ShiftCommand::from_wire(d[0]) {
                Some(cmd) => Decoded::Shift(cmd),
                None => Decoded::Ignored,
            };
        }

        Decoded::Ignored
    }

    /// Run one main-loop iteration of bus work.
    ///
    /// Applies the recovery policy whether or not a frame arrived, then
    /// drains and dispatches at most one frame. Telemetry and sensor
    /// writes land in the caller-owned structs; a decoded shift request
    /// is returned for the caller to forward to the sequencer.
    pub fn poll<B: CanBus, W: WatchdogKick>(
        &self,
        bus: &mut B,
        monitor: &mut TimeoutMonitor,
        telemetry: &mut EngineTelemetry,
        sensors: &mut ThrottleSensors,
        hw_watchdog: &mut W,
        now_ms: u64,
    ) -> Result<Option<ShiftCommand>, B::Error> {
        self.recover_if_needed(bus, monitor, now_ms)?;

        let Some(frame) = bus.try_receive()? else {
            return Ok(None);
        };

        // Liveness is bus-wide, not per-ID, and only real traffic may
        // postpone the hardware reset.
        monitor.reset(WatchdogChannel::BusTraffic, now_ms);
        hw_watchdog.kick();

        let decoded = self.decode(&frame);

        if self.proves_ecu_alive(&decoded) {
            monitor.reset(WatchdogChannel::EcuHeartbeat, now_ms);
        }

        match decoded {
            Decoded::Rpm(rpm) => telemetry.rpm = rpm,
            Decoded::WaterTemp(temp) => telemetry.water_temp = temp,
            Decoded::Throttle(values) => *sensors = values,
            Decoded::Shift(cmd) => return Ok(Some(cmd)),
            Decoded::Heartbeat | Decoded::Ignored => {}
        }

        Ok(None)
    }

    /// Rate-limited controller reset when the error counters run high.
    fn recover_if_needed<B: CanBus>(
        &self,
        bus: &mut B,
        monitor: &mut TimeoutMonitor,
        now_ms: u64,
    ) -> Result<(), B::Error> {
        let counters = bus.error_counters();
        let faulted = counters.tx_errors > BUS_ERROR_FAULT_THRESHOLD
            || counters.rx_errors > BUS_ERROR_FAULT_THRESHOLD;

        if faulted && monitor.bus_reset_allowed(now_ms) {
            log::warn!(
                "CAN error counters high (tx={}, rx={}), resetting controller",
                counters.tx_errors,
                counters.rx_errors,
            );
            bus.reset()?;
            monitor.reset(WatchdogChannel::BusReset, now_ms);
        }
        Ok(())
    }

    /// Whether a decoded frame counts as proof the ECU is alive.
    fn proves_ecu_alive(&self, decoded: &Decoded) -> bool {
        match decoded {
            Decoded::Heartbeat => true,
            Decoded::Rpm(_) | Decoded::WaterTemp(_) | Decoded::Throttle(_) => {
                self.profile.liveness == Liveness::AnyRecognizedFrame
            }
            Decoded::Shift(_) | Decoded::Ignored => false,
        }
    }

    fn decode_temperature(&self, raw: [u8; 2]) -> f32 {
        // Raw values above 32767 wrap to negative temperatures.
        let signed = u16::from_le_bytes(raw) as i16;
        let celsius = f32::from(signed) / 10.0;
        match self.profile.temperature_unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchdogConfig;
    use crate::hal::{MockCanBus, MockWatchdog};

    fn celsius_profile() -> CanProfile {
        CanProfile::default().with_temperature_unit(TemperatureUnit::Celsius)
    }

    fn rig() -> (
        CanDispatcher,
        MockCanBus,
        TimeoutMonitor,
        EngineTelemetry,
        ThrottleSensors,
        MockWatchdog,
    ) {
        (
            CanDispatcher::new(&celsius_profile()),
            MockCanBus::new(),
            TimeoutMonitor::new(&WatchdogConfig::default(), 0),
            EngineTelemetry::default(),
            ThrottleSensors::default(),
            MockWatchdog::new(),
        )
    }

    // ========================================================================
    // Decode
    // ========================================================================

    #[test]
    fn decodes_rpm_little_endian() {
        let dispatcher = CanDispatcher::new(&celsius_profile());
        let frame = CanFrame::new(0x0CFF_F048, &[0xB8, 0x0B, 0, 0]).unwrap();
        assert_eq!(dispatcher.decode(&frame), Decoded::Rpm(3000));
    }

    #[test]
    fn decodes_positive_temperature() {
        // Raw 400 = 0x0190 little-endian in bytes 4..6 -> 40.0
        let dispatcher = CanDispatcher::new(&celsius_profile());
        let frame = CanFrame::new(0x0CFF_F548, &[0, 0, 0, 0, 0x90, 0x01]).unwrap();
        assert_eq!(dispatcher.decode(&frame), Decoded::WaterTemp(40.0));
    }

    #[test]
    fn decodes_negative_temperature_via_wraparound() {
        // Raw 0xFF9C = -100 in 16-bit two's complement -> -10.0
        let dispatcher = CanDispatcher::new(&celsius_profile());
        let frame = CanFrame::new(0x0CFF_F548, &[0, 0, 0, 0, 0x9C, 0xFF]).unwrap();
        assert_eq!(dispatcher.decode(&frame), Decoded::WaterTemp(-10.0));
    }

    #[test]
    fn fahrenheit_profile_converts_after_decode() {
        let dispatcher = CanDispatcher::new(&CanProfile::default());
        let frame = CanFrame::new(0x0CFF_F548, &[0, 0, 0, 0, 0x90, 0x01]).unwrap();
        // 40.0 C -> 104.0 F
        assert_eq!(dispatcher.decode(&frame), Decoded::WaterTemp(104.0));
    }

    #[test]
    fn decodes_throttle_sensors() {
        let dispatcher = CanDispatcher::new(&celsius_profile());
        let frame = CanFrame::new(0x0CFF_F648, &[10, 12, 30, 31]).unwrap();
        assert_eq!(
            dispatcher.decode(&frame),
            Decoded::Throttle(ThrottleSensors {
                apps1: 10,
                apps2: 12,
                tps1: 30,
                tps2: 31,
            })
        );
    }

    #[test]
    fn decodes_shift_commands_and_ignores_unknown_codes() {
        let dispatcher = CanDispatcher::new(&celsius_profile());
        let steering = |code| CanFrame::new(0, &[code]).unwrap();

        assert_eq!(
            dispatcher.decode(&steering(10)),
            Decoded::Shift(ShiftCommand::Upshift)
        );
        assert_eq!(
            dispatcher.decode(&steering(11)),
            Decoded::Shift(ShiftCommand::Downshift)
        );
        assert_eq!(
            dispatcher.decode(&steering(14)),
            Decoded::Shift(ShiftCommand::HalfShift)
        );
        assert_eq!(dispatcher.decode(&steering(99)), Decoded::Ignored);
    }

    #[test]
    fn unknown_ids_and_short_payloads_are_ignored() {
        let dispatcher = CanDispatcher::new(&celsius_profile());

        let unknown = CanFrame::new(0x7FF, &[1, 2, 3]).unwrap();
        assert_eq!(dispatcher.decode(&unknown), Decoded::Ignored);

        // Temperature frame too short for bytes 4..6
        let short = CanFrame::new(0x0CFF_F548, &[0, 0, 0, 0]).unwrap();
        assert_eq!(dispatcher.decode(&short), Decoded::Ignored);
    }

    #[test]
    fn dedicated_heartbeat_id_decodes_as_heartbeat() {
        let profile = celsius_profile().with_heartbeat_id(0x0CFF_F148);
        let dispatcher = CanDispatcher::new(&profile);

        let frame = CanFrame::new(0x0CFF_F148, &[]).unwrap();
        assert_eq!(dispatcher.decode(&frame), Decoded::Heartbeat);
    }

    // ========================================================================
    // Poll: dispatch and liveness
    // ========================================================================

    #[test]
    fn poll_updates_telemetry_and_kicks_watchdog() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();
        bus.queue_frame(CanFrame::new(0x0CFF_F048, &[0xB8, 0x0B]).unwrap());

        let cmd = dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 10)
            .unwrap();

        assert_eq!(cmd, None);
        assert_eq!(telemetry.rpm, 3000);
        assert_eq!(hw.kicks, 1);
    }

    #[test]
    fn idle_bus_does_not_kick_hardware_watchdog() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();

        for now in 0..50 {
            dispatcher
                .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, now)
                .unwrap();
        }
        assert_eq!(hw.kicks, 0);
    }

    #[test]
    fn any_recognized_frame_feeds_ecu_watchdog() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();

        // Let the ECU channel expire, then revive it with a throttle frame
        assert!(!monitor.tick(3000).ecu_connected);
        bus.queue_frame(CanFrame::new(0x0CFF_F648, &[1, 2, 3, 4]).unwrap());
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 3000)
            .unwrap();

        assert!(monitor.tick(3001).ecu_connected);
    }

    #[test]
    fn dedicated_heartbeat_mode_ignores_data_frames_for_liveness() {
        let profile = celsius_profile()
            .with_heartbeat_id(0x0CFF_F148)
            .with_liveness(Liveness::DedicatedHeartbeat);
        let dispatcher = CanDispatcher::new(&profile);
        let mut bus = MockCanBus::new();
        let mut monitor = TimeoutMonitor::new(&WatchdogConfig::default(), 0);
        let mut telemetry = EngineTelemetry::default();
        let mut sensors = ThrottleSensors::default();
        let mut hw = MockWatchdog::new();

        assert!(!monitor.tick(3000).ecu_connected);

        // RPM traffic alone does not prove the ECU alive in this mode
        bus.queue_frame(CanFrame::new(0x0CFF_F048, &[0xB8, 0x0B]).unwrap());
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 3000)
            .unwrap();
        assert!(!monitor.tick(3001).ecu_connected);
        assert_eq!(telemetry.rpm, 3000); // but the data still lands

        // The dedicated heartbeat does
        bus.queue_frame(CanFrame::new(0x0CFF_F148, &[]).unwrap());
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 3001)
            .unwrap();
        assert!(monitor.tick(3002).ecu_connected);
    }

    #[test]
    fn poll_returns_shift_command_for_forwarding() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();
        bus.queue_frame(CanFrame::new(0, &[11]).unwrap());

        let cmd = dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 0)
            .unwrap();
        assert_eq!(cmd, Some(ShiftCommand::Downshift));
    }

    // ========================================================================
    // Poll: recovery policy
    // ========================================================================

    #[test]
    fn high_error_counters_reset_controller_once_per_second() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();

        bus.inject_errors(6, 0);
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 0)
            .unwrap();
        assert_eq!(bus.reset_count, 1);

        // Errors spike again 500 ms later: rate limiter holds the reset back
        bus.inject_errors(0, 9);
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 500)
            .unwrap();
        assert_eq!(bus.reset_count, 1);

        // After the full interval the reset is allowed again
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 1000)
            .unwrap();
        assert_eq!(bus.reset_count, 2);
    }

    #[test]
    fn counters_at_threshold_do_not_trigger_recovery() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();

        bus.inject_errors(5, 5); // threshold is strictly greater-than
        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 0)
            .unwrap();
        assert_eq!(bus.reset_count, 0);
    }

    #[test]
    fn recovery_runs_even_when_a_frame_is_pending() {
        let (dispatcher, mut bus, mut monitor, mut telemetry, mut sensors, mut hw) = rig();

        bus.inject_errors(9, 0);
        bus.queue_frame(CanFrame::new(0x0CFF_F048, &[0x10, 0x27]).unwrap());

        dispatcher
            .poll(&mut bus, &mut monitor, &mut telemetry, &mut sensors, &mut hw, 0)
            .unwrap();

        assert_eq!(bus.reset_count, 1);
        assert_eq!(telemetry.rpm, 10000);
    }
}
