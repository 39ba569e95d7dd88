//! Hardware abstraction traits for PWM, digital I/O, delays, and the
//! hardware watchdog.
//!
//! These are the seams between the control logic and the board support
//! package. For testing and desktop development, use the mock
//! implementations from [`crate::hal::mock`]; a real target implements
//! the same traits over its vendor HAL.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PwmOutput`] | Duty-cycle control of the fan and water pump |
//! | [`DigitalOutput`] | Solenoids, spark cut, starter, status LED |
//! | [`DigitalInput`] | Neutral switch |
//! | [`Delay`] | Blocking waits for shift pulse timing |
//! | [`WatchdogKick`] | External reset-on-hang watchdog |
//!
//! # Example
//!
//! ```rust
//! use rs_bcm::traits::{DigitalOutput, PwmOutput};
//! use rs_bcm::hal::{MockPin, MockPwm};
//!
//! let mut fan = MockPwm::new();
//! fan.set_duty(0.7).unwrap();
//! assert_eq!(fan.duty, 0.7);
//!
//! let mut led = MockPin::new();
//! led.set_high().unwrap();
//! assert!(led.is_set_high());
//! ```

/// PWM output with a settable duty cycle and carrier period.
///
/// Implement this for each PWM-capable pin. Duty is expressed as a
/// fraction of the carrier period in `0.0..=1.0`.
///
/// # Implementation Notes
///
/// - Duty values outside `0.0..=1.0` should be clamped before applying
/// - Period changes may glitch the output; the core only sets the period
///   once at startup
pub trait PwmOutput {
    /// Error type for PWM operations.
    type Error;

    /// Set the carrier period in microseconds.
    fn set_period_us(&mut self, period_us: u32) -> Result<(), Self::Error>;

    /// Set the duty cycle as a fraction in `0.0..=1.0`.
    ///
    /// Values outside this range should be clamped.
    fn set_duty(&mut self, duty: f32) -> Result<(), Self::Error>;

    /// Convenience method to drive the output fully off.
    fn off(&mut self) -> Result<(), Self::Error> {
        self.set_duty(0.0)
    }
}

/// Push-pull digital output.
///
/// Electrical polarity is the implementer's concern; the control logic
/// documents at each call site whether a line is active high or active
/// low.
pub trait DigitalOutput {
    /// Error type for pin operations.
    type Error;

    /// Drive the pin high.
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the pin low.
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Drive the pin to the given level.
    fn set_state(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Returns the last level the pin was driven to.
    fn is_set_high(&self) -> bool;
}

/// Digital input with an internal or external pull.
///
/// Reads cannot fail on the supported targets, so this trait is
/// infallible.
pub trait DigitalInput {
    /// Returns true if the pin currently reads high.
    fn is_high(&self) -> bool;
}

/// Blocking millisecond delay.
///
/// Used by the shift sequencer, whose pulse widths are hard real-time
/// deadlines: the sequence runs on a dedicated thread and simply blocks
/// it for the duration of each phase.
pub trait Delay {
    /// Block the calling thread for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// External reset-on-hang watchdog.
///
/// The dispatcher kicks this only on actual bus traffic, which couples
/// "the firmware is alive" to "the bus is alive": a hung main loop and a
/// dead bus both end in a hardware reset.
pub trait WatchdogKick {
    /// Feed the watchdog, postponing the hardware reset.
    fn kick(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPin {
        high: bool,
        highs: usize,
        lows: usize,
    }

    impl DigitalOutput for TestPin {
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

    #[test]
    fn set_state_default_impl_routes_to_edges() {
        let mut pin = TestPin {
            high: false,
            highs: 0,
            lows: 0,
        };

        pin.set_state(true).unwrap();
        assert!(pin.is_set_high());
        assert_eq!(pin.highs, 1);

        pin.set_state(false).unwrap();
        assert!(!pin.is_set_high());
        assert_eq!(pin.lows, 1);
    }

    struct TestPwm {
        duty: f32,
    }

    impl PwmOutput for TestPwm {
        type Error = ();

        fn set_period_us(&mut self, _period_us: u32) -> Result<(), ()> {
            Ok(())
        }

        fn set_duty(&mut self, duty: f32) -> Result<(), ()> {
            self.duty = duty.clamp(0.0, 1.0);
            Ok(())
        }
    }

    #[test]
    fn off_default_impl_zeroes_duty() {
        let mut pwm = TestPwm { duty: 0.9 };
        pwm.off().unwrap();
        assert_eq!(pwm.duty, 0.0);
    }
}
