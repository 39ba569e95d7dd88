//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and CAN traits,
//! enabling development and testing on desktop without a target board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPwm`] | [`PwmOutput`] | Records duty and period writes |
//! | [`MockPin`] | [`DigitalOutput`] | Records level changes |
//! | [`MockInput`] | [`DigitalInput`] | Settable input level |
//! | [`MockCanBus`] | [`CanBus`] | Queued frames, captured transmits, injectable errors |
//! | [`MockWatchdog`] | [`WatchdogKick`] | Counts kicks |
//! | [`MockDelay`] | [`Delay`] | Records requested delays |
//! | [`PulseRecorder`] | n/a | Shared pin/delay event log for sequence tests (`std`) |
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::hal::MockCanBus;
//! use rs_bcm::{CanBus, CanFrame};
//!
//! let mut bus = MockCanBus::new();
//! bus.queue_frame(CanFrame::new(0x123, &[1, 2]).unwrap());
//!
//! assert_eq!(bus.try_receive().unwrap().unwrap().id, 0x123);
//! assert_eq!(bus.try_receive().unwrap(), None);
//! ```
//!
//! [`PwmOutput`]: crate::traits::PwmOutput
//! [`DigitalOutput`]: crate::traits::DigitalOutput
//! [`DigitalInput`]: crate::traits::DigitalInput
//! [`CanBus`]: crate::traits::CanBus
//! [`WatchdogKick`]: crate::traits::WatchdogKick
//! [`Delay`]: crate::traits::Delay

use crate::traits::{
    BusErrorCounters, CanBus, CanFrame, Delay, DigitalInput, DigitalOutput, PwmOutput, WatchdogKick,
};

extern crate alloc;
use alloc::vec::Vec;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock PWM output for testing.
///
/// Records the last duty and period written plus a call count.
///
/// # Example
///
/// ```rust
/// use rs_bcm::hal::MockPwm;
/// use rs_bcm::traits::PwmOutput;
///
/// let mut pwm = MockPwm::new();
/// pwm.set_duty(1.5).unwrap(); // clamped
/// assert_eq!(pwm.duty, 1.0);
/// assert_eq!(pwm.duty_writes, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockPwm {
    /// Last duty cycle written (already clamped to 0.0..=1.0).
    pub duty: f32,
    /// Last carrier period written, in microseconds.
    pub period_us: u32,
    /// Number of times `set_duty` was called.
    pub duty_writes: usize,
}

impl MockPwm {
    /// Creates a new mock PWM at zero duty.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PwmOutput for MockPwm {
    type Error = ();

    fn set_period_us(&mut self, period_us: u32) -> Result<(), ()> {
        self.period_us = period_us;
        Ok(())
    }

    fn set_duty(&mut self, duty: f32) -> Result<(), ()> {
        self.duty = duty.clamp(0.0, 1.0);
        self.duty_writes += 1;
        Ok(())
    }
}

/// Mock digital output for testing.
///
/// Tracks the current level and how many times each edge was driven.
#[derive(Debug, Default)]
pub struct MockPin {
    /// Current driven level.
    pub high: bool,
    /// Number of `set_high` calls.
    pub highs: usize,
    /// Number of `set_low` calls.
    pub lows: usize,
}

impl MockPin {
    /// Creates a new mock pin driven low.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DigitalOutput for MockPin {
    type Error = ();

    fn set_high(&mut self) -> Result<(), ()> {
        self.high = true;
        self.highs += 1;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), ()> {
        self.high = false;
        self.lows += 1;
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Mock digital input with a settable level.
#[derive(Debug, Default)]
pub struct MockInput {
    /// Level the input reads.
    pub high: bool,
}

impl MockInput {
    /// Creates a new mock input reading low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock input reading high.
    pub fn high() -> Self {
        Self { high: true }
    }

    /// Set the level the input reads.
    pub fn set(&mut self, high: bool) {
        self.high = high;
    }
}

impl DigitalInput for MockInput {
    fn is_high(&self) -> bool {
        self.high
    }
}

/// Mock hardware watchdog that counts kicks.
#[derive(Debug, Default)]
pub struct MockWatchdog {
    /// Number of times `kick` was called.
    pub kicks: usize,
}

impl MockWatchdog {
    /// Creates a new mock watchdog with zero kicks.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchdogKick for MockWatchdog {
    fn kick(&mut self) {
        self.kicks += 1;
    }
}

/// Mock delay that records every requested wait instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Requested delays, in call order.
    pub delays: Vec<u32>,
}

impl MockDelay {
    /// Creates a new mock delay with no recorded waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total milliseconds requested so far.
    pub fn total_ms(&self) -> u64 {
        self.delays.iter().map(|&ms| ms as u64).sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

// ============================================================================
// CAN Mock
// ============================================================================

/// Mock CAN bus for testing.
///
/// Queue inbound frames, inspect captured transmits, and inject error
/// counters to exercise the recovery policy.
///
/// # Example
///
/// ```rust
/// use rs_bcm::hal::MockCanBus;
/// use rs_bcm::{CanBus, CanFrame};
///
/// let mut bus = MockCanBus::new();
/// bus.inject_errors(6, 0);
/// assert_eq!(bus.error_counters().tx_errors, 6);
///
/// bus.reset().unwrap();
/// assert_eq!(bus.reset_count, 1);
/// assert_eq!(bus.error_counters().tx_errors, 0);
/// ```
#[derive(Debug, Default)]
pub struct MockCanBus {
    /// Frames waiting to be received (FIFO).
    pub rx_queue: Vec<CanFrame>,
    /// Frames captured from `transmit`.
    pub transmitted: Vec<CanFrame>,
    /// Error counters returned by `error_counters`.
    pub counters: BusErrorCounters,
    /// Number of times `reset` was called.
    pub reset_count: usize,
}

impl MockCanBus {
    /// Creates a new mock bus with an empty receive queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound frame.
    pub fn queue_frame(&mut self, frame: CanFrame) {
        self.rx_queue.push(frame);
    }

    /// Set the error counters the controller reports.
    pub fn inject_errors(&mut self, tx: u8, rx: u8) {
        self.counters = BusErrorCounters {
            tx_errors: tx,
            rx_errors: rx,
        };
    }

    /// Transmitted frames with the given identifier.
    pub fn transmitted_with_id(&self, id: u32) -> Vec<&CanFrame> {
        self.transmitted.iter().filter(|f| f.id == id).collect()
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    fn try_receive(&mut self) -> Result<Option<CanFrame>, ()> {
        if self.rx_queue.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.rx_queue.remove(0)))
        }
    }

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), ()> {
        self.transmitted.push(frame.clone());
        Ok(())
    }

    fn error_counters(&self) -> BusErrorCounters {
        self.counters
    }

    fn reset(&mut self) -> Result<(), ()> {
        self.reset_count += 1;
        self.counters = BusErrorCounters::default();
        Ok(())
    }
}

// ============================================================================
// Pulse sequence recording (std)
// ============================================================================

/// One event in a recorded actuator sequence.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseEvent {
    /// A pin was driven to a level.
    Set {
        /// Pin label given at construction.
        pin: &'static str,
        /// Level driven.
        high: bool,
    },
    /// A blocking delay elapsed.
    Delay {
        /// Requested milliseconds.
        ms: u32,
    },
}

/// Shared event log for verifying actuator pulse ordering.
///
/// Hand out [`RecordedPin`]s and a [`RecordedDelay`] built from the same
/// recorder, run a sequence, then assert on the interleaved event list.
///
/// # Example
///
/// ```rust
/// use rs_bcm::hal::{PulseEvent, PulseRecorder};
/// use rs_bcm::traits::{Delay, DigitalOutput};
///
/// let recorder = PulseRecorder::new();
/// let mut pin = recorder.pin("solenoid");
/// let mut delay = recorder.delay();
///
/// pin.set_high().unwrap();
/// delay.delay_ms(40);
/// pin.set_low().unwrap();
///
/// let events = recorder.events();
/// assert_eq!(events.len(), 3);
/// assert_eq!(events[1], PulseEvent::Delay { ms: 40 });
/// ```
#[cfg(feature = "std")]
#[derive(Clone, Debug, Default)]
pub struct PulseRecorder {
    log: std::sync::Arc<std::sync::Mutex<Vec<PulseEvent>>>,
}

#[cfg(feature = "std")]
impl PulseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorded output pin with the given label.
    pub fn pin(&self, name: &'static str) -> RecordedPin {
        RecordedPin {
            name,
            high: false,
            log: std::sync::Arc::clone(&self.log),
        }
    }

    /// Create a recorded delay.
    pub fn delay(&self) -> RecordedDelay {
        RecordedDelay {
            log: std::sync::Arc::clone(&self.log),
        }
    }

    /// Snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<PulseEvent> {
        self.log.lock().unwrap().clone()
    }
}

/// Digital output that appends its level changes to a [`PulseRecorder`].
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct RecordedPin {
    name: &'static str,
    high: bool,
    log: std::sync::Arc<std::sync::Mutex<Vec<PulseEvent>>>,
}

#[cfg(feature = "std")]
impl DigitalOutput for RecordedPin {
    type Error = ();

    fn set_high(&mut self) -> Result<(), ()> {
        self.high = true;
        self.log.lock().unwrap().push(PulseEvent::Set {
            pin: self.name,
            high: true,
        });
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), ()> {
        self.high = false;
        self.log.lock().unwrap().push(PulseEvent::Set {
            pin: self.name,
            high: false,
        });
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Delay that appends its waits to a [`PulseRecorder`] instead of sleeping.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct RecordedDelay {
    log: std::sync::Arc<std::sync::Mutex<Vec<PulseEvent>>>,
}

#[cfg(feature = "std")]
impl Delay for RecordedDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.log.lock().unwrap().push(PulseEvent::Delay { ms });
    }
}

// ============================================================================
// Tests
// ============================================================================
