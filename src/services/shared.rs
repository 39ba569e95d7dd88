//! Unified shared state for all BCM tasks.
//!
//! `SharedBcm` wraps the three stateful components behind separate locks
//! and supplies the single monotonic time base every task stamps its
//! events with. Separate locks matter here: the shift sequencer blocks
//! its thread for tens of milliseconds, and the ETC monitor must tick
//! every 10 ms regardless; neither may wait on the other.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::bcm::BcmCore;
use crate::cooling::CoolingController;
use crate::etc::EtcMonitor;
use crate::telemetry::BcmSnapshot;
use crate::traits::{CanBus, DigitalInput, DigitalOutput, PwmOutput, WatchdogKick};

/// Shared state for all BCM tasks.
///
/// # Lock discipline
///
/// - `core` is locked by the main loop (every iteration, briefly), the
///   cooling task (to copy facts and telemetry), the ETC task (to copy
///   sensor values), and the status task (to transmit)
/// - `cooling` is locked only by the cooling task and snapshots
/// - `etc` is locked only by the ETC task, the status task, and snapshots
///
/// Every field keeps a single writer; all cross-task reads go through
/// brief closure-scoped critical sections.
pub struct SharedBcm<B, I, O, W, P, E>
where
    B: CanBus,
    I: DigitalInput,
    O: DigitalOutput<Error = B::Error>,
    W: WatchdogKick,
    P: PwmOutput,
    E: DigitalOutput,
{
    core: Mutex<BcmCore<B, I, O, W>>,
    cooling: Mutex<CoolingController<P>>,
    etc: Mutex<EtcMonitor<E>>,
    start_time: Instant,
}

impl<B, I, O, W, P, E> SharedBcm<B, I, O, W, P, E>
where
    B: CanBus,
    I: DigitalInput,
    O: DigitalOutput<Error = B::Error>,
    W: WatchdogKick,
    P: PwmOutput,
    E: DigitalOutput,
{
    /// Wrap the components. `Instant::now()` becomes the shared time base.
    pub fn new(
        core: BcmCore<B, I, O, W>,
        cooling: CoolingController<P>,
        etc: EtcMonitor<E>,
    ) -> Self {
        Self {
            core: Mutex::new(core),
            cooling: Mutex::new(cooling),
            etc: Mutex::new(etc),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since the shared state was created.
    ///
    /// The unified time base for every task; watchdog stamps, cooling
    /// dwell, and starter pulses all measure against this.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Access the main-loop core under its lock.
    pub fn with_core<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BcmCore<B, I, O, W>) -> R,
    {
        f(&mut self.lock(&self.core))
    }

    /// Access the cooling controller under its lock.
    pub fn with_cooling<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut CoolingController<P>) -> R,
    {
        f(&mut self.lock(&self.cooling))
    }

    /// Access the ETC monitor under its lock.
    pub fn with_etc<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut EtcMonitor<E>) -> R,
    {
        f(&mut self.lock(&self.etc))
    }

    /// Whether the throttle-enable output is currently high.
    pub fn throttle_enabled(&self) -> bool {
        self.lock(&self.etc).throttle_enabled()
    }

    /// Assemble a full observable-state snapshot.
    ///
    /// Takes each lock briefly in turn; never holds two at once.
    pub fn snapshot(&self) -> BcmSnapshot {
        let (facts, telemetry, sensors, in_neutral) = {
            let core = self.lock(&self.core);
            (core.facts(), core.telemetry(), core.sensors(), core.in_neutral())
        };
        let vehicle_state = self.lock(&self.cooling).state();
        let (throttle_enabled, etc_tripped) = {
            let etc = self.lock(&self.etc);
            (etc.throttle_enabled(), etc.is_tripped())
        };

        BcmSnapshot {
            vehicle_state,
            facts,
            telemetry,
            sensors,
            throttle_enabled,
            etc_tripped,
            in_neutral,
        }
    }

    /// Lock a component, recovering the guard if a panicking task
    /// poisoned it; the components hold no invariants a poisoned write
    /// could have broken halfway.
    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
