//! # rs-bcm
//!
//! Firmware core of a Body Control Module (BCM) for a small racing vehicle:
//! engine cooling control, CAN-bus health monitoring, paddle-shift actuator
//! sequencing, and a latching electronic-throttle safety monitor.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for PWM, digital I/O, the CAN
//!   controller, and the hardware reset-on-hang watchdog
//! - **Connectivity watchdogs**: Per-channel timeout monitor deriving
//!   "ECU alive" / "bus alive" facts from heartbeat traffic
//! - **Thermal state machine**: Five-state cooling control with hysteresis,
//!   minimum dwell, and fail-safe output mapping
//! - **ETC safety monitor**: Redundant pedal/throttle cross-checks with a
//!   terminal latch that only a power cycle can clear
//! - **Shift sequencing**: Timed solenoid pulses with a spark-cut interlock
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and CAN-controller abstractions
//! - `watchdog` - Timeout monitor and connectivity facts
//! - `dispatch` - CAN frame decode and bus-error recovery
//! - `cooling` - Thermal/operational state machine
//! - `etc` - Electronic-throttle safety monitor
//! - `shift` - Paddle-shift actuator sequencer
//! - `status` - Periodic status frame reporter
//! - `bcm` - Main-loop core that ties monitor, dispatcher, and outputs together
//! - `hal` - Mock implementations for testing
//! - `services` - Threaded task runner at the firmware cadences (std only)
//!
//! ## Example
//!
//! ```rust
//! use rs_bcm::{
//!     BcmConfig, BcmCore, CanFrame,
//!     hal::{MockCanBus, MockInput, MockPin, MockWatchdog},
//! };
//!
//! let config = BcmConfig::default();
//! let mut core = BcmCore::new(
//!     MockCanBus::new(),
//!     MockInput::new(),   // neutral switch
//!     MockPin::new(),     // starter
//!     MockPin::new(),     // status LED
//!     MockWatchdog::new(),
//!     &config,
//! );
//!
//! // Feed an RPM frame and poll once at t=0
//! core.bus_mut().queue_frame(CanFrame::new(0x0CFF_F048, &[0xB8, 0x0B]).unwrap());
//! core.poll(0).unwrap();
//! assert_eq!(core.telemetry().rpm, 3000);
//! assert!(core.facts().ecu_connected);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Main-loop core: watchdog tick, bus-error recovery, frame dispatch.
pub mod bcm;
/// Thermal/operational state machine driving the fan and pump outputs.
pub mod cooling;
/// CAN frame decode and the rate-limited bus-error-recovery policy.
pub mod dispatch;
/// Electronic-throttle safety monitor with a terminal latch.
pub mod etc;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Paddle-shift actuator sequencer with spark-cut interlock.
pub mod shift;
/// Periodic status frame reporter.
pub mod status;
/// Engine telemetry, throttle sensor values, and observable snapshots.
pub mod telemetry;
/// Core traits for hardware and CAN-controller abstraction.
pub mod traits;
/// Timeout monitor deriving connectivity facts from heartbeat traffic.
pub mod watchdog;

/// Shared configuration for timeouts, CAN profile, cooling, ETC, and shifting.
pub mod config;

/// Threaded task runner and shared state (requires `std`).
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use bcm::BcmCore;
pub use config::{
    BcmConfig, CanProfile, CoolingConfig, EtcConfig, Liveness, ShiftConfig, TemperatureUnit,
    WatchdogConfig,
};
pub use cooling::{CoolingController, VehicleState};
pub use dispatch::{CanDispatcher, Decoded};
pub use etc::{EtcMonitor, FaultCounters};
pub use shift::{ShiftCommand, ShiftSequencer};
pub use status::StatusReporter;
pub use telemetry::{BcmSnapshot, EngineTelemetry, ThrottleSensors};
pub use traits::{
    // CAN
    BusErrorCounters,
    CanBus,
    CanFrame,
    // Hardware
    Delay,
    DigitalInput,
    DigitalOutput,
    PwmOutput,
    WatchdogKick,
};
pub use watchdog::{ConnectivityFacts, TimeoutMonitor, WatchdogChannel};
