//! Main-loop core: watchdog tick, bus-error recovery, frame dispatch, and
//! the miscellaneous outputs no other component owns.
//!
//! [`BcmCore`] owns the CAN bus, the timeout monitor, the decoded
//! telemetry, and the starter / status-LED outputs. Its [`poll`] method is
//! the body of the unbounded main loop; the cooling controller, ETC
//! monitor, and shift sequencer run on their own cadences and read the
//! facts this core maintains.
//!
//! The throttle-enable output is *not* here; see
//! [`EtcMonitor`](crate::EtcMonitor) for the ownership invariant.
//!
//! [`poll`]: BcmCore::poll
//!
//! # Example
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
//!     MockInput::new(),
//!     MockPin::new(),
//!     MockPin::new(),
//!     MockWatchdog::new(),
//!     &config,
//! );
//! core.init().unwrap();
//!
//! core.bus_mut().queue_frame(CanFrame::new(0x0CFF_F048, &[0x10, 0x27]).unwrap());
//! core.poll(0).unwrap();
//! assert_eq!(core.telemetry().rpm, 10000);
//! ```

use crate::config::BcmConfig;
use crate::dispatch::CanDispatcher;
use crate::shift::ShiftCommand;
use crate::status::StatusReporter;
use crate::telemetry::{EngineTelemetry, ThrottleSensors};
use crate::traits::{CanBus, DigitalInput, DigitalOutput, WatchdogKick};
use crate::watchdog::{ConnectivityFacts, TimeoutMonitor, WatchdogChannel};

/// The main-loop core.
///
/// # Type Parameters
///
/// - `B`: CAN controller
/// - `I`: neutral-switch input
/// - `O`: digital output implementation (starter and status LED)
/// - `W`: hardware reset-on-hang watchdog
///
/// All fallible collaborators share one error type so results compose
/// with `?` through the poll path.
#[derive(Debug)]
pub struct BcmCore<B, I, O, W>
where
    B: CanBus,
    I: DigitalInput,
    O: DigitalOutput<Error = B::Error>,
    W: WatchdogKick,
{
    bus: B,
    neutral: I,
    starter: O,
    status_led: O,
    hw_watchdog: W,
    dispatcher: CanDispatcher,
    monitor: TimeoutMonitor,
    status: StatusReporter,
    telemetry: EngineTelemetry,
    sensors: ThrottleSensors,
}

impl<B, I, O, W> BcmCore<B, I, O, W>
where
    B: CanBus,
    I: DigitalInput,
    O: DigitalOutput<Error = B::Error>,
    W: WatchdogKick,
{
    /// Create a core with all watchdog channels freshly reset at t=0.
    ///
    /// Timestamps passed to [`poll`](Self::poll) and
    /// [`pulse_starter`](Self::pulse_starter) must come from the same
    /// monotonic millisecond time base, starting at or after zero.
    pub fn new(bus: B, neutral: I, starter: O, status_led: O, hw_watchdog: W, config: &BcmConfig) -> Self {
        Self {
            bus,
            neutral,
            starter,
            status_led,
            hw_watchdog,
            dispatcher: CanDispatcher::new(&config.can),
            monitor: TimeoutMonitor::new(&config.watchdog, 0),
            status: StatusReporter::new(&config.can),
            telemetry: EngineTelemetry::default(),
            sensors: ThrottleSensors::default(),
        }
    }

    /// Park the outputs at their boot levels. Call once at startup.
    pub fn init(&mut self) -> Result<(), B::Error> {
        self.starter.set_low()?;
        // Facts start optimistic, so the bus indicator starts lit.
        self.status_led.set_high()
    }

    /// Run one main-loop iteration.
    ///
    /// Advances the timeout monitor, zeroes telemetry while the ECU is
    /// stale, releases an expired starter pulse, applies the bus recovery
    /// policy, and dispatches at most one inbound frame. Returns a shift
    /// command when one arrived, for forwarding to the sequencer.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<ShiftCommand>, B::Error> {
        let facts = self.monitor.tick(now_ms);

        // This core owns the telemetry, so the stale-clears rule lives
        // here rather than inside the monitor.
        if !facts.ecu_connected {
            self.telemetry.clear();
        }

        self.status_led.set_state(facts.bus_connected)?;

        if self.monitor.starter_expired(now_ms) {
            log::debug!("starter dead-man expired, de-energizing");
            self.starter.set_low()?;
        }

        self.dispatcher.poll(
            &mut self.bus,
            &mut self.monitor,
            &mut self.telemetry,
            &mut self.sensors,
            &mut self.hw_watchdog,
            now_ms,
        )
    }

    /// Energize the starter and arm its dead-man timer.
    ///
    /// The output stays energized until either a repeat pulse re-arms the
    /// timer or [`poll`](Self::poll) releases it after the dead-man
    /// window.
    pub fn pulse_starter(&mut self, now_ms: u64) -> Result<(), B::Error> {
        self.starter.set_high()?;
        self.monitor.reset(WatchdogChannel::StarterPulse, now_ms);
        Ok(())
    }

    /// Transmit the status frame.
    pub fn send_status(&mut self, throttle_enabled: bool) -> Result<(), B::Error> {
        let in_neutral = self.in_neutral();
        self.status.send(&mut self.bus, in_neutral, throttle_enabled)
    }

    /// Whether the gearbox is in neutral.
    ///
    /// The switch is wired with a pull-up and closes to ground in
    /// neutral.
    pub fn in_neutral(&self) -> bool {
        !self.neutral.is_high()
    }

    /// Connectivity facts from the most recent poll.
    pub fn facts(&self) -> ConnectivityFacts {
        self.monitor.facts()
    }

    /// Latest decoded engine telemetry.
    pub fn telemetry(&self) -> EngineTelemetry {
        self.telemetry
    }

    /// Latest decoded throttle sensor values.
    pub fn sensors(&self) -> ThrottleSensors {
        self.sensors
    }

    /// Whether the starter output is currently energized.
    pub fn starter_energized(&self) -> bool {
        self.starter.is_set_high()
    }

    /// Mutable access to the CAN bus (frame injection in tests and demos).
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
