//! Trait definitions for hardware and CAN-controller abstraction.
//!
//! This module defines the collaborator interfaces that allow the BCM core
//! to run on real hardware or against desktop mocks:
//!
//! - `hardware`: PWM outputs, digital I/O, blocking delays, and the
//!   hardware reset-on-hang watchdog
//! - `can`: the CAN controller, frames, and bus error counters
//!
//! # Hardware Abstraction
//!
//! The key traits are:
//!
//! - [`PwmOutput`]: duty-cycle output for the fan and water pump
//! - [`DigitalOutput`] / [`DigitalInput`]: solenoids, spark cut, starter,
//!   status LED, neutral switch
//! - [`Delay`]: blocking millisecond waits for shift pulse timing
//! - [`WatchdogKick`]: the external reset-on-hang watchdog
//! - [`CanBus`]: frame receive/transmit, error counters, controller reset

pub mod can;
pub mod hardware;

pub use can::*;
pub use hardware::*;
