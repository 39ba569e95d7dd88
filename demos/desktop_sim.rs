//! Desktop simulation of the BCM against mock hardware.
//!
//! Runs the full task set (main loop, cooling, ETC, status, shift) on
//! threads and scripts a short drive: engine start, warm-up past the hot
//! threshold, a couple of paddle shifts, a persistent pedal-sensor fault
//! that trips the ETC latch, and finally bus silence dropping the state
//! machine into Safety.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_sim
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rs_bcm::hal::{MockCanBus, MockInput, MockPin, MockPwm, MockWatchdog, SleepDelay};
use rs_bcm::services::{BcmRunner, SharedBcm};
use rs_bcm::{
    BcmConfig, BcmCore, CanFrame, CoolingController, EtcMonitor, ShiftSequencer, TemperatureUnit,
};

type Shared = SharedBcm<MockCanBus, MockInput, MockPin, MockWatchdog, MockPwm, MockPin>;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=================================");
    println!("  rs-bcm Desktop Simulation");
    println!("=================================");
    println!();

    let config = BcmConfig::default();
    // Thresholds default to Fahrenheit; keep the profile consistent.
    assert_eq!(config.can.temperature_unit, TemperatureUnit::Fahrenheit);

    let core = BcmCore::new(
        MockCanBus::new(),
        MockInput::new(), // neutral switch, closed at boot
        MockPin::new(),   // starter
        MockPin::new(),   // status LED
        MockWatchdog::new(),
        &config,
    );
    let cooling = CoolingController::new(MockPwm::new(), MockPwm::new(), &config.cooling);
    let etc = EtcMonitor::new(MockPin::new(), &config.etc);
    // Real (sleeping) delays so shift pulses occupy their true widths
    let sequencer = ShiftSequencer::new(
        MockPin::new(),
        MockPin::new(),
        MockPin::new(),
        SleepDelay,
        &config.shift,
    );

    let shared = Arc::new(SharedBcm::new(core, cooling, etc));
    let runner = BcmRunner::start(Arc::clone(&shared), sequencer)?;

    let rpm_id = config.can.rpm_id;
    let temp_id = config.can.water_temp_id;
    let throttle_id = config.can.throttle_id;
    let steering_id = config.can.steering_id;

    // Phase 1: crank, then engine running cool
    // (3000 rpm, raw 700 = 70.0 C = 158 F)
    println!("phase 1: crank and run cool");
    let now = shared.now_ms();
    shared
        .with_core(|core| core.pulse_starter(now))
        .expect("mock starter cannot fail");
    thread::sleep(Duration::from_millis(200)); // dead-man releases at 100 ms
    assert!(!shared.with_core(|core| core.starter_energized()));

    for _ in 0..15 {
        inject(&shared, CanFrame::new(rpm_id, &[0xB8, 0x0B]).unwrap());
        inject(
            &shared,
            CanFrame::new(temp_id, &[0, 0, 0, 0, 0xBC, 0x02]).unwrap(),
        );
        inject(
            &shared,
            CanFrame::new(throttle_id, &[20, 20, 20, 20]).unwrap(),
        );
        thread::sleep(Duration::from_millis(100));
    }
    report(&shared);

    // Phase 2: warmed up past the hot edge (raw 920 = 92.0 C = 197.6 F)
    println!("phase 2: hot running");
    for _ in 0..25 {
        inject(&shared, CanFrame::new(rpm_id, &[0x10, 0x27]).unwrap());
        inject(
            &shared,
            CanFrame::new(temp_id, &[0, 0, 0, 0, 0x98, 0x03]).unwrap(),
        );
        thread::sleep(Duration::from_millis(100));
    }
    report(&shared);

    // Phase 3: paddle shifts from the steering wheel
    println!("phase 3: upshift, then downshift");
    inject(&shared, CanFrame::new(steering_id, &[10]).unwrap());
    thread::sleep(Duration::from_millis(300));
    inject(&shared, CanFrame::new(steering_id, &[11]).unwrap());
    thread::sleep(Duration::from_millis(300));

    // Phase 4: persistent APPS disagreement trips the ETC latch
    println!("phase 4: pedal sensor fault");
    inject(
        &shared,
        CanFrame::new(throttle_id, &[80, 30, 75, 75]).unwrap(),
    );
    thread::sleep(Duration::from_millis(300));
    report(&shared);

    // Phase 5: bus goes silent; the state machine falls to Safety once
    // the traffic watchdog expires
    println!("phase 5: bus silence");
    thread::sleep(Duration::from_millis(
        config.watchdog.can_timeout_ms + 1500,
    ));
    report(&shared);

    runner.stop();
    println!();
    println!("Simulation complete.");
    Ok(())
}

fn inject(shared: &Arc<Shared>, frame: CanFrame) {
    shared.with_core(|core| core.bus_mut().queue_frame(frame));
}

fn report(shared: &Arc<Shared>) {
    let s = shared.snapshot();
    println!(
        "  state={:<12} ecu={} bus={} rpm={} temp={:.1} throttle_enabled={} tripped={}",
        s.vehicle_state.as_str(),
        s.facts.ecu_connected,
        s.facts.bus_connected,
        s.telemetry.rpm,
        s.telemetry.water_temp,
        s.throttle_enabled,
        s.etc_tripped,
    );
}
