//! Threaded task runner for the firmware cadences (requires `std`).
//!
//! Four tasks run concurrently, mirroring the firmware's scheduling:
//!
//! | Task | Cadence |
//! |------|---------|
//! | Main poll loop (watchdogs, recovery, dispatch) | as fast as possible |
//! | Thermal state machine | 1 Hz |
//! | ETC safety monitor | 100 Hz |
//! | Status reporter | 10 Hz |
//!
//! plus a fifth thread that services shift requests, since a pulse
//! sequence blocks for tens of milliseconds and must never stall the ETC
//! cadence.
//!
//! # Shared State Pattern
//!
//! All tasks share a single [`SharedBcm`] behind an `Arc`. Each component
//! sits behind its own `Mutex` with closure-scoped access, so the chatty
//! main loop, the 10 ms ETC tick, and the blocking shift sequencer never
//! contend on one lock:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_bcm::services::{BcmRunner, SharedBcm};
//!
//! let shared = Arc::new(SharedBcm::new(core, cooling, etc_monitor));
//! let runner = BcmRunner::start(Arc::clone(&shared), sequencer)?;
//!
//! // Observe from the outside while the tasks run
//! let snapshot = shared.snapshot();
//! println!("state: {:?}", snapshot.vehicle_state);
//!
//! runner.stop();
//! ```

pub mod runner;
pub mod shared;

pub use runner::*;
pub use shared::*;
