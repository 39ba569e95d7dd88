//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits defined in
//! [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - [`SleepDelay`]: `std::thread::sleep`-backed [`Delay`] for the desktop
//!   runner (requires `std`)
//!
//! A real target supplies its own implementations over the vendor HAL;
//! none ship in this crate.
//!
//! [`Delay`]: crate::traits::Delay

pub mod mock;

pub use mock::*;

#[cfg(feature = "std")]
use crate::traits::Delay;

/// Blocking delay backed by `std::thread::sleep`.
///
/// Timing is best-effort on a desktop OS; accurate enough for the
/// simulator, not a substitute for a hardware timer on a real target.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepDelay;

#[cfg(feature = "std")]
impl Delay for SleepDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}
