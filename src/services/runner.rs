//! Thread-per-task runner at the firmware cadences.
//!
//! [`BcmRunner::start`] performs the boot sequence (park outputs, arm the
//! throttle enable), then spawns five threads: the main poll loop, the
//! 1 Hz state machine, the 100 Hz ETC monitor, the 10 Hz status reporter,
//! and the shift service thread. Shift requests travel a bounded channel
//! of depth one; a request arriving while one is buffered is dropped,
//! never interleaved with a pulse in progress.
//!
//! Hardware faults inside a task are logged and the task carries on; the
//! control design already degrades safely through the watchdog and state
//! machine paths, so a transient pin error must not kill a thread.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::services::shared::SharedBcm;
use crate::shift::{ShiftCommand, ShiftSequencer};
use crate::traits::{CanBus, Delay, DigitalInput, DigitalOutput, PwmOutput, WatchdogKick};

/// Thermal state machine cadence.
pub const STATE_MACHINE_PERIOD_MS: u64 = 1000;
/// ETC safety monitor cadence.
pub const ETC_PERIOD_MS: u64 = 10;
/// Status reporter cadence.
pub const STATUS_PERIOD_MS: u64 = 100;
/// Yield between main-loop iterations; keeps a desktop host responsive
/// where the real firmware simply spins.
pub const MAIN_LOOP_YIELD_MS: u64 = 1;

/// Handle over the running task threads.
pub struct BcmRunner {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl BcmRunner {
    /// Run the boot sequence and spawn the task threads.
    pub fn start<B, I, O, W, P, E, SO, D>(
        shared: Arc<SharedBcm<B, I, O, W, P, E>>,
        mut sequencer: ShiftSequencer<SO, D>,
    ) -> Result<Self>
    where
        B: CanBus + Send + 'static,
        B::Error: Debug,
        I: DigitalInput + Send + 'static,
        O: DigitalOutput<Error = B::Error> + Send + 'static,
        W: WatchdogKick + Send + 'static,
        P: PwmOutput + Send + 'static,
        P::Error: Debug,
        E: DigitalOutput + Send + 'static,
        E::Error: Debug,
        SO: DigitalOutput + Send + 'static,
        SO::Error: Debug,
        D: Delay + Send + 'static,
    {
        // Boot sequence: outputs to their rest levels, then the single
        // boot-time write of the throttle-enable line.
        shared
            .with_core(|core| core.init())
            .map_err(|e| anyhow!("core init failed: {e:?}"))?;
        shared
            .with_cooling(|cooling| cooling.init())
            .map_err(|e| anyhow!("cooling init failed: {e:?}"))?;
        shared
            .with_etc(|etc| etc.arm())
            .map_err(|e| anyhow!("ETC arm failed: {e:?}"))?;
        sequencer
            .park()
            .map_err(|e| anyhow!("shift park failed: {e:?}"))?;

        let stop = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();

        // Shift service thread: ends when the main loop drops its sender.
        let (shift_tx, shift_rx) = mpsc::sync_channel::<ShiftCommand>(1);
        handles.push(
            thread::Builder::new()
                .name("bcm-shift".into())
                .spawn(move || {
                    while let Ok(cmd) = shift_rx.recv() {
                        if let Err(e) = sequencer.execute(cmd) {
                            log::error!("shift {} failed: {e:?}", cmd.as_str());
                        }
                    }
                })
                .context("spawning shift thread")?,
        );

        // Main poll loop.
        {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            handles.push(
                thread::Builder::new()
                    .name("bcm-main".into())
                    .spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            let now_ms = shared.now_ms();
                            match shared.with_core(|core| core.poll(now_ms)) {
                                Ok(Some(cmd)) => match shift_tx.try_send(cmd) {
                                    Ok(()) => {}
                                    Err(TrySendError::Full(cmd)) => {
                                        log::debug!("shift in progress, dropping {}", cmd.as_str())
                                    }
                                    Err(TrySendError::Disconnected(_)) => break,
                                },
                                Ok(None) => {}
                                Err(e) => log::error!("main loop poll failed: {e:?}"),
                            }
                            thread::sleep(Duration::from_millis(MAIN_LOOP_YIELD_MS));
                        }
                    })
                    .context("spawning main loop thread")?,
            );
        }

        // ETC safety monitor, 100 Hz. Copies the sensor values out of the
        // core lock, then ticks under its own lock so nothing can stall it.
        {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            handles.push(
                thread::Builder::new()
                    .name("bcm-etc".into())
                    .spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            let sensors = shared.with_core(|core| core.sensors());
                            if let Err(e) = shared.with_etc(|etc| etc.tick(&sensors)) {
                                log::error!("ETC tick failed: {e:?}");
                            }
                            thread::sleep(Duration::from_millis(ETC_PERIOD_MS));
                        }
                    })
                    .context("spawning ETC thread")?,
            );
        }

        // Thermal state machine, 1 Hz.
        {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            handles.push(
                thread::Builder::new()
                    .name("bcm-cooling".into())
                    .spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            let now_ms = shared.now_ms();
                            let (facts, telemetry) =
                                shared.with_core(|core| (core.facts(), core.telemetry()));
                            if let Err(e) = shared
                                .with_cooling(|cooling| cooling.tick(&facts, &telemetry, now_ms))
                            {
                                log::error!("cooling tick failed: {e:?}");
                            }
                            sleep_unless_stopped(&stop, STATE_MACHINE_PERIOD_MS);
                        }
                    })
                    .context("spawning cooling thread")?,
            );
        }

        // Status reporter, 10 Hz.
        {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            handles.push(
                thread::Builder::new()
                    .name("bcm-status".into())
                    .spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            let enabled = shared.throttle_enabled();
                            if let Err(e) = shared.with_core(|core| core.send_status(enabled)) {
                                log::error!("status transmit failed: {e:?}");
                            }
                            thread::sleep(Duration::from_millis(STATUS_PERIOD_MS));
                        }
                    })
                    .context("spawning status thread")?,
            );
        }

        log::info!("BCM tasks started");
        Ok(Self { stop, handles })
    }

    /// Signal every task to stop and join them.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles {
            let _ = handle.join();
        }
        log::info!("BCM tasks stopped");
    }
}

/// Sleep up to `ms`, waking early if the stop flag is raised.
fn sleep_unless_stopped(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 && !stop.load(Ordering::Relaxed) {
        let slice = remaining.min(50);
        thread::sleep(Duration::from_millis(slice));
        remaining -= slice;
    }
}
