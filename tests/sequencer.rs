use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use npm1300_bringup::data_types::{Device, GpioPin, Led, Level, LoadSwitch, PowerOutput};
use npm1300_bringup::error::{Operation, RoutineError, StartupError};
use npm1300_bringup::{Hardware, Routine, RunMode, Sequencer};

#[derive(Clone, Debug, PartialEq)]
enum Event {
    LedOn(Led),
    LedOff(Led),
    Configure(GpioPin, Level),
    Gpio(GpioPin, Level),
    Enable(PowerOutput),
    Disable(PowerOutput),
    SetVoltage(PowerOutput, u32, u32),
    Delay(u32),
}

type Log = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, PartialEq)]
struct FakeError(i32);

#[derive(Default)]
struct FakeBoard {
    log: Log,
    not_ready: Vec<Device>,
    fail_configure: Option<GpioPin>,
    fail_set_voltage: bool,
    fail_enable: bool,
}

impl Hardware for FakeBoard {
    type Error = FakeError;

    fn is_ready(&mut self, device: Device) -> bool {
        !self.not_ready.contains(&device)
    }

    fn led_on(&mut self, led: Led) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::LedOn(led));
        Ok(())
    }

    fn led_off(&mut self, led: Led) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::LedOff(led));
        Ok(())
    }

    fn gpio_configure_output(&mut self, pin: GpioPin, initial: Level) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::Configure(pin, initial));
        if self.fail_configure == Some(pin) {
            return Err(FakeError(-5));
        }
        Ok(())
    }

    fn gpio_set(&mut self, pin: GpioPin, level: Level) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::Gpio(pin, level));
        Ok(())
    }

    fn enable(&mut self, output: PowerOutput) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::Enable(output));
        if self.fail_enable {
            return Err(FakeError(-5));
        }
        Ok(())
    }

    fn disable(&mut self, output: PowerOutput) -> Result<(), FakeError> {
        self.log.borrow_mut().push(Event::Disable(output));
        Ok(())
    }

    fn set_voltage(&mut self, output: PowerOutput, min_uv: u32, max_uv: u32) -> Result<(), FakeError> {
        self.log
            .borrow_mut()
            .push(Event::SetVoltage(output, min_uv, max_uv));
        if self.fail_set_voltage {
            return Err(FakeError(-22));
        }
        Ok(())
    }
}

/// Records sleeps; unwinds once `budget` sleeps have happened so `-> !` paths can be observed.
struct FakeDelay {
    log: Log,
    budget: Option<usize>,
    taken: usize,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::Delay(ms));
        self.taken += 1;
        if self.budget.is_some_and(|budget| self.taken >= budget) {
            panic!("delay budget exhausted");
        }
    }
}

fn sequencer(board: FakeBoard, budget: Option<usize>) -> (Sequencer<FakeBoard, FakeDelay>, Log) {
    let log = board.log.clone();
    let delay = FakeDelay {
        log: log.clone(),
        budget,
        taken: 0,
    };
    (Sequencer::new(board, delay), log)
}

fn ready_board() -> FakeBoard {
    FakeBoard::default()
}

fn board_without(devices: &[Device]) -> FakeBoard {
    FakeBoard {
        not_ready: devices.to_vec(),
        ..FakeBoard::default()
    }
}

fn run_until_budget(board: FakeBoard, mode: RunMode, budget: usize) -> Vec<Event> {
    let (mut seq, log) = sequencer(board, Some(budget));
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        seq.run(mode);
    }));
    assert!(outcome.is_err(), "run must only stop through the delay budget");
    log.borrow().clone()
}

fn cycle(on: &[Event], off: &[Event], half_ms: u32) -> Vec<Event> {
    let mut events = on.to_vec();
    events.push(Event::Delay(half_ms));
    events.extend_from_slice(off);
    events.push(Event::Delay(half_ms));
    events
}

const LS1: PowerOutput = PowerOutput::LoadSwitch1;
const LS2: PowerOutput = PowerOutput::LoadSwitch2;
const VOUT1: PowerOutput = PowerOutput::Vout1;

#[test]
fn not_ready_device_aborts_without_touching_hardware() {
    let needs: [(Routine, &[Device]); 7] = [
        (Routine::RgbLeds, &[Device::Leds]),
        (
            Routine::AllTogether,
            &[
                Device::Leds,
                Device::Gpio,
                Device::LoadSwitch1,
                Device::LoadSwitch2,
                Device::Vout1,
            ],
        ),
        (Routine::Gpio1Gpio2, &[Device::Gpio]),
        (Routine::Gpio3, &[Device::Gpio]),
        (Routine::Vout1Enable, &[Device::Vout1]),
        (Routine::LoadSwitch1, &[Device::LoadSwitch1]),
        (Routine::LoadSwitch2, &[Device::LoadSwitch2]),
    ];

    for (routine, devices) in needs {
        for &missing in devices {
            let (mut seq, log) = sequencer(board_without(&[missing]), None);
            let result = seq.run_routine(routine);
            assert_eq!(result, Err(RoutineError::NotReady(missing)), "{:?}", routine);
            assert!(log.borrow().is_empty(), "{:?} touched hardware without {:?}", routine, missing);
        }
    }
}

#[test]
fn all_together_toggles_every_output_in_lockstep() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.all_together(), Ok(()));

    let gpios = [GpioPin::GPIO1, GpioPin::GPIO2, GpioPin::GPIO3];
    let mut expected: Vec<Event> = gpios
        .iter()
        .map(|&pin| Event::Configure(pin, Level::Low))
        .collect();
    expected.push(Event::SetVoltage(VOUT1, 3_000_000, 3_000_000));

    let mut on: Vec<Event> = Led::ALL.iter().map(|&led| Event::LedOn(led)).collect();
    on.extend(gpios.iter().map(|&pin| Event::Gpio(pin, Level::High)));
    on.extend([LS1, LS2, VOUT1].map(Event::Enable));
    let mut off: Vec<Event> = Led::ALL.iter().map(|&led| Event::LedOff(led)).collect();
    off.extend(gpios.iter().map(|&pin| Event::Gpio(pin, Level::Low)));
    off.extend([LS1, LS2, VOUT1].map(Event::Disable));

    for _ in 0..5 {
        expected.extend(cycle(&on, &off, 2_000));
    }
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn all_together_stops_before_toggling_when_voltage_rejected() {
    let board = FakeBoard {
        fail_set_voltage: true,
        ..FakeBoard::default()
    };
    let (mut seq, log) = sequencer(board, None);
    let result = seq.all_together();
    assert_eq!(
        result,
        Err(RoutineError::Failed {
            device: Device::Vout1,
            op: Operation::SetVoltage,
            error: FakeError(-22),
        })
    );
    assert!(!log.borrow().iter().any(|e| matches!(
        e,
        Event::LedOn(_) | Event::Gpio(..) | Event::Enable(_) | Event::Delay(_)
    )));
}

#[test]
fn rgb_leds_blinks_all_three_five_times() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.rgb_leds(), Ok(()));

    let on: Vec<Event> = Led::ALL.iter().map(|&led| Event::LedOn(led)).collect();
    let off: Vec<Event> = Led::ALL.iter().map(|&led| Event::LedOff(led)).collect();
    let expected: Vec<Event> = (0..5).flat_map(|_| cycle(&on, &off, 2_000)).collect();
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn gpio_routines_configure_then_toggle_their_pins() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.gpio1_gpio2(), Ok(()));
    {
        let events = log.borrow();
        assert_eq!(events[0], Event::Configure(GpioPin::GPIO1, Level::Low));
        assert_eq!(events[1], Event::Configure(GpioPin::GPIO2, Level::Low));
        let highs = events
            .iter()
            .filter(|e| matches!(e, Event::Gpio(_, Level::High)))
            .count();
        assert_eq!(highs, 10);
        assert!(!events.iter().any(|e| matches!(e, Event::Gpio(GpioPin::GPIO3, _))));
    }

    log.borrow_mut().clear();
    assert_eq!(seq.gpio3(), Ok(()));
    let on = [Event::Gpio(GpioPin::GPIO3, Level::High)];
    let off = [Event::Gpio(GpioPin::GPIO3, Level::Low)];
    let mut expected = vec![Event::Configure(GpioPin::GPIO3, Level::Low)];
    for _ in 0..5 {
        expected.extend(cycle(&on, &off, 2_000));
    }
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn gpio_configure_failure_aborts_before_any_set() {
    let board = FakeBoard {
        fail_configure: Some(GpioPin::GPIO2),
        ..FakeBoard::default()
    };
    let (mut seq, log) = sequencer(board, None);
    let result = seq.gpio1_gpio2();
    assert_eq!(
        result,
        Err(RoutineError::Failed {
            device: Device::Gpio,
            op: Operation::ConfigureGpio(GpioPin::GPIO2),
            error: FakeError(-5),
        })
    );
    assert_eq!(
        *log.borrow(),
        vec![
            Event::Configure(GpioPin::GPIO1, Level::Low),
            Event::Configure(GpioPin::GPIO2, Level::Low),
        ]
    );
}

#[test]
fn vout1_requests_exact_window_then_enables_and_holds() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.vout1_enable(), Ok(()));
    assert_eq!(
        *log.borrow(),
        vec![
            Event::SetVoltage(VOUT1, 3_000_000, 3_000_000),
            Event::Enable(VOUT1),
            Event::Delay(5_000),
        ]
    );
}

#[test]
fn vout1_never_enabled_when_voltage_request_fails() {
    let board = FakeBoard {
        fail_set_voltage: true,
        ..FakeBoard::default()
    };
    let (mut seq, log) = sequencer(board, None);
    assert!(matches!(
        seq.vout1_enable(),
        Err(RoutineError::Failed {
            op: Operation::SetVoltage,
            ..
        })
    ));
    assert_eq!(
        *log.borrow(),
        vec![Event::SetVoltage(VOUT1, 3_000_000, 3_000_000)]
    );
}

#[test]
fn vout1_enable_failure_skips_hold() {
    let board = FakeBoard {
        fail_enable: true,
        ..FakeBoard::default()
    };
    let (mut seq, log) = sequencer(board, None);
    assert_eq!(
        seq.vout1_enable(),
        Err(RoutineError::Failed {
            device: Device::Vout1,
            op: Operation::Enable,
            error: FakeError(-5),
        })
    );
    assert!(!log.borrow().contains(&Event::Delay(5_000)));
}

#[test]
fn load_switch_cycles_only_its_output() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.load_switch(LoadSwitch::Ls2), Ok(()));
    let expected: Vec<Event> = (0..5)
        .flat_map(|_| cycle(&[Event::Enable(LS2)], &[Event::Disable(LS2)], 2_000))
        .collect();
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn load_switch_1_cycles_ls1_and_never_touches_buck1() {
    let (mut seq, log) = sequencer(ready_board(), None);
    assert_eq!(seq.load_switch(LoadSwitch::Ls1), Ok(()));
    let log = log.borrow();
    assert_eq!(log.iter().filter(|e| **e == Event::Enable(LS1)).count(), 5);
    assert!(!log.contains(&Event::Enable(VOUT1)));
    assert!(!log.contains(&Event::Disable(VOUT1)));
}

#[test]
fn every_routine_names_its_test_points() {
    assert!(Routine::AllTogether.test_points().contains("PVDD1"));
    assert!(Routine::AllTogether.test_points().contains("PVDD2"));
    assert!(Routine::AllTogether.test_points().contains("C15"));
    assert!(Routine::Gpio1Gpio2.test_points().contains("GPIO1"));
    assert!(Routine::Gpio1Gpio2.test_points().contains("GPIO2"));
    assert!(Routine::Gpio3.test_points().contains("EN_BIO"));
    assert!(Routine::Gpio3.test_points().contains("C19"));
    assert!(Routine::Vout1Enable.test_points().contains("C15"));
    assert_eq!(Routine::LoadSwitch1.test_points(), "PVDD1");
    assert_eq!(Routine::LoadSwitch2.test_points(), "PVDD2");
    for routine in Routine::SEQUENCE {
        assert!(!routine.test_points().is_empty(), "{:?}", routine);
    }
}

/// Reduce a sequential run to the first distinctive call of each routine.
fn routine_markers(events: &[Event]) -> Vec<&'static str> {
    let mut markers: Vec<&'static str> = events
        .iter()
        .filter_map(|e| match e {
            Event::LedOn(Led::Red) => Some("leds"),
            Event::Configure(GpioPin::GPIO1, _) => Some("gpio1/2"),
            Event::Configure(GpioPin::GPIO3, _) => Some("gpio3"),
            Event::SetVoltage(..) => Some("vout1"),
            Event::Enable(PowerOutput::LoadSwitch1) => Some("ls1"),
            Event::Enable(PowerOutput::LoadSwitch2) => Some("ls2"),
            _ => None,
        })
        .collect();
    markers.dedup();
    markers
}

#[test]
fn sequential_runs_each_routine_once_in_order() {
    let (mut seq, log) = sequencer(ready_board(), None);
    seq.run_sequential();

    let events = log.borrow();
    assert_eq!(
        routine_markers(&events),
        ["leds", "gpio1/2", "gpio3", "vout1", "ls1", "ls2"]
    );
    assert_eq!(events.first(), Some(&Event::Delay(1_000)));
    assert_eq!(events.last(), Some(&Event::Delay(2_000)));
    // VOUT1 is enabled once and never switched off.
    assert_eq!(events.iter().filter(|e| **e == Event::Enable(VOUT1)).count(), 1);
    assert!(!events.contains(&Event::Disable(VOUT1)));
}

#[test]
fn sequential_keeps_going_past_a_failed_routine() {
    let (mut seq, log) = sequencer(board_without(&[Device::Gpio]), None);
    seq.run_sequential();
    assert_eq!(
        routine_markers(&log.borrow()),
        ["leds", "vout1", "ls1", "ls2"]
    );
}

#[test]
fn idle_mode_blinks_blue_forever() {
    // settle + four full blinks
    let events = run_until_budget(ready_board(), RunMode::Idle, 9);
    let mut expected = vec![Event::Delay(1_000)];
    for _ in 0..4 {
        expected.extend([
            Event::LedOn(Led::Blue),
            Event::Delay(1_000),
            Event::LedOff(Led::Blue),
            Event::Delay(1_000),
        ]);
    }
    assert_eq!(events, expected);
}

#[test]
fn sequential_mode_ends_in_alive_blink() {
    // settle, 58 sleeps of routines and gaps, then two blinks
    let events = run_until_budget(ready_board(), RunMode::Sequential, 1 + 58 + 4);
    let tail = &events[events.len() - 8..];
    let blink = [
        Event::LedOn(Led::Blue),
        Event::Delay(1_000),
        Event::LedOff(Led::Blue),
        Event::Delay(1_000),
    ];
    assert_eq!(&tail[..4], &blink);
    assert_eq!(&tail[4..], &blink);
    assert_eq!(
        routine_markers(&events),
        ["leds", "gpio1/2", "gpio3", "vout1", "ls1", "ls2"]
    );
}

#[test]
fn heartbeat_without_leds_still_waits() {
    let (mut seq, log) = sequencer(board_without(&[Device::Leds]), None);
    seq.heartbeat_once();
    assert_eq!(*log.borrow(), vec![Event::Delay(1_000)]);
}

#[test]
fn pmic_down_parks_without_touching_outputs() {
    let events = run_until_budget(board_without(&[Device::Pmic]), RunMode::AllTogether, 3);
    assert_eq!(events, vec![Event::Delay(10_000); 3]);
}

#[test]
fn startup_tolerates_missing_gpio_controller() {
    let (mut seq, _) = sequencer(board_without(&[Device::Gpio]), None);
    assert_eq!(seq.startup(), Ok(()));

    let (mut seq, _) = sequencer(board_without(&[Device::Pmic]), None);
    assert_eq!(seq.startup(), Err(StartupError::PmicNotReady));
}

#[test]
fn vout1_mode_leaves_rail_on_and_parks() {
    let events = run_until_budget(ready_board(), RunMode::Vout1, 3);
    assert_eq!(
        events,
        vec![
            Event::Delay(1_000),
            Event::SetVoltage(VOUT1, 3_000_000, 3_000_000),
            Event::Enable(VOUT1),
            Event::Delay(5_000),
            Event::Delay(10_000),
        ]
    );
}

#[test]
fn rgb_mode_repeats_after_gap() {
    // settle, first pass (10 sleeps), repeat gap, first sleep of the second pass
    let events = run_until_budget(ready_board(), RunMode::RgbLeds, 13);
    let gap_at = 1 + 5 * 8;
    assert_eq!(events[gap_at], Event::Delay(1_000));
    assert_eq!(events[gap_at + 1], Event::LedOn(Led::Red));
    assert_eq!(events.last(), Some(&Event::Delay(2_000)));
}

#[test]
fn all_together_mode_reruns_configuration_each_pass() {
    // settle, first pass (10 sleeps), repeat gap, first sleep of the second pass
    let events = run_until_budget(ready_board(), RunMode::AllTogether, 13);
    let set_voltage = events
        .iter()
        .filter(|e| matches!(e, Event::SetVoltage(..)))
        .count();
    assert_eq!(set_voltage, 2);
}
