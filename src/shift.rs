//! Paddle-shift actuator sequencer.
//!
//! Each shift is a fixed, blocking pulse sequence on the two gearbox
//! solenoids, bracketed by a spark-cut interlock: ignition is cut before
//! the mechanical pulse starts and restored only after it ends, so the
//! dog rings are unloaded while the drum moves. The sequences run on a
//! dedicated thread and block it for tens of milliseconds; nothing else
//! shares that thread.
//!
//! One command is fully serviced before the next is accepted: the runner
//! feeds this component through a bounded channel of depth one and drops
//! overflow rather than interleaving pulses.
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::config::ShiftConfig;
//! use rs_bcm::hal::{MockDelay, MockPin};
//! use rs_bcm::{ShiftCommand, ShiftSequencer};
//!
//! let mut sequencer = ShiftSequencer::new(
//!     MockPin::new(), // spark cut
//!     MockPin::new(), // upshift solenoid
//!     MockPin::new(), // downshift solenoid
//!     MockDelay::new(),
//!     &ShiftConfig::default(),
//! );
//! sequencer.park().unwrap();
//!
//! sequencer.execute(ShiftCommand::Upshift).unwrap();
//! ```

use crate::config::ShiftConfig;
use crate::traits::{Delay, DigitalOutput};

/// Steering-wheel command byte for an upshift.
pub const WIRE_UPSHIFT: u8 = 10;
/// Steering-wheel command byte for a downshift.
pub const WIRE_DOWNSHIFT: u8 = 11;
/// Steering-wheel command byte for a half-shift.
pub const WIRE_HALFSHIFT: u8 = 14;

/// A shift request decoded from the steering wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShiftCommand {
    /// Full upshift pulse.
    Upshift,
    /// Full downshift pulse.
    Downshift,
    /// Partial preload shift: both solenoids with an offset start.
    HalfShift,
}

impl ShiftCommand {
    /// Decode a steering-wheel command byte.
    ///
    /// Unrecognized codes are not an error, just not a shift.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_bcm::ShiftCommand;
    ///
    /// assert_eq!(ShiftCommand::from_wire(10), Some(ShiftCommand::Upshift));
    /// assert_eq!(ShiftCommand::from_wire(11), Some(ShiftCommand::Downshift));
    /// assert_eq!(ShiftCommand::from_wire(14), Some(ShiftCommand::HalfShift));
    /// assert_eq!(ShiftCommand::from_wire(0), None);
    /// ```
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            WIRE_UPSHIFT => Some(ShiftCommand::Upshift),
            WIRE_DOWNSHIFT => Some(ShiftCommand::Downshift),
            WIRE_HALFSHIFT => Some(ShiftCommand::HalfShift),
            _ => None,
        }
    }

    /// Returns the command as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftCommand::Upshift => "upshift",
            ShiftCommand::Downshift => "downshift",
            ShiftCommand::HalfShift => "halfshift",
        }
    }
}

/// The shift actuator outputs and their pulse timing.
///
/// # Type Parameters
///
/// - `O`: digital output implementation for all three pins
/// - `D`: blocking delay source
///
/// The spark-cut line is active low (the ignition runs while the pin is
/// high); both solenoid lines are active high.
#[derive(Debug)]
pub struct ShiftSequencer<O: DigitalOutput, D: Delay> {
    spark_cut: O,
    upshift: O,
    downshift: O,
    delay: D,
    config: ShiftConfig,
}

impl<O: DigitalOutput, D: Delay> ShiftSequencer<O, D> {
    /// Create a sequencer. Outputs are not touched until
    /// [`park`](Self::park).
    pub fn new(spark_cut: O, upshift: O, downshift: O, delay: D, config: &ShiftConfig) -> Self {
        Self {
            spark_cut,
            upshift,
            downshift,
            delay,
            config: *config,
        }
    }

    /// Drive all outputs to their resting levels. Call once at boot.
    pub fn park(&mut self) -> Result<(), O::Error> {
        self.spark_cut.set_high()?; // active low: high = ignition on
        self.upshift.set_low()?;
        self.downshift.set_low()
    }

    /// Run one complete shift sequence, blocking until it finishes.
    pub fn execute(&mut self, cmd: ShiftCommand) -> Result<(), O::Error> {
        log::debug!("shift: {}", cmd.as_str());
        match cmd {
            ShiftCommand::Upshift => self.pulse_one(true, self.config.upshift_pulse_ms),
            ShiftCommand::Downshift => self.pulse_one(false, self.config.downshift_pulse_ms),
            ShiftCommand::HalfShift => self.half_shift(),
        }
    }

    /// Single-solenoid pulse bracketed by the spark-cut interlock.
    fn pulse_one(&mut self, up: bool, pulse_ms: u32) -> Result<(), O::Error> {
        let interlock = self.config.interlock_delay_ms;

        self.spark_cut.set_low()?;
        self.delay.delay_ms(interlock);

        let solenoid = if up { &mut self.upshift } else { &mut self.downshift };
        solenoid.set_high()?;
        self.delay.delay_ms(pulse_ms);
        solenoid.set_low()?;

        self.delay.delay_ms(interlock);
        self.spark_cut.set_high()
    }

    /// Both solenoids with an offset start, released together.
    fn half_shift(&mut self) -> Result<(), O::Error> {
        let interlock = self.config.interlock_delay_ms;

        self.spark_cut.set_low()?;
        self.delay.delay_ms(interlock);

        self.upshift.set_high()?;
        self.delay.delay_ms(self.config.halfshift_offset_ms);
        self.downshift.set_high()?;
        self.delay.delay_ms(self.config.halfshift_hold_ms);
        self.upshift.set_low()?;
        self.downshift.set_low()?;

        self.delay.delay_ms(interlock);
        self.spark_cut.set_high()
    }
}
