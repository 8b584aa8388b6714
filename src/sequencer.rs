//! Bring-up sequencer.
//!
//! Drives the companion board through fixed on/off patterns so the outputs can
//! be probed with a meter. Every routine checks the devices it needs first and
//! returns without touching anything if one is missing. Dispatch through
//! [`Sequencer::run`] never returns: the board only leaves a run mode through
//! an external reset.

use embedded_hal::delay::DelayNs;

use crate::config::{Config, RunMode};
use crate::data_types::{Device, GpioPin, Led, Level, LoadSwitch, PowerOutput};
use crate::error::{Operation, RoutineError, StartupError};
use crate::fmt::Debug2Format;
use crate::hardware::Hardware;

const GPIO_1_2: [GpioPin; 2] = [GpioPin::GPIO1, GpioPin::GPIO2];
const GPIO_3: [GpioPin; 1] = [GpioPin::GPIO3];
const ALL_GPIOS: [GpioPin; 3] = [GpioPin::GPIO1, GpioPin::GPIO2, GpioPin::GPIO3];
const ALL_POWER: [PowerOutput; 3] = [PowerOutput::LoadSwitch1, PowerOutput::LoadSwitch2, PowerOutput::Vout1];

/// Individual bring-up routines.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Routine {
    RgbLeds,
    AllTogether,
    Gpio1Gpio2,
    Gpio3,
    Vout1Enable,
    LoadSwitch1,
    LoadSwitch2,
}

impl Routine {
    /// Order used by [`RunMode::Sequential`].
    pub const SEQUENCE: [Routine; 6] = [
        Routine::RgbLeds,
        Routine::Gpio1Gpio2,
        Routine::Gpio3,
        Routine::Vout1Enable,
        Routine::LoadSwitch1,
        Routine::LoadSwitch2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Routine::RgbLeds => "RGB LEDs",
            Routine::AllTogether => "all together",
            Routine::Gpio1Gpio2 => "GPIO1/GPIO2",
            Routine::Gpio3 => "GPIO3",
            Routine::Vout1Enable => "VOUT1 enable",
            Routine::LoadSwitch1 => "load switch 1",
            Routine::LoadSwitch2 => "load switch 2",
        }
    }

    /// Board test points to meter while the routine runs.
    pub fn test_points(self) -> &'static str {
        match self {
            Routine::RgbLeds => "red, green and blue LEDs",
            Routine::AllTogether => "GPIO1, GPIO2, GPIO3 pins, PVDD1, PVDD2 and C15 (VOUT1)",
            Routine::Gpio1Gpio2 => "GPIO1 and GPIO2 pins",
            Routine::Gpio3 => "EN_BIO test point and V_BIO at C19",
            Routine::Vout1Enable => "3 V at C15",
            Routine::LoadSwitch1 => "PVDD1",
            Routine::LoadSwitch2 => "PVDD2",
        }
    }
}

fn set_leds<H: Hardware>(hw: &mut H, on: bool) {
    for led in Led::ALL {
        let _ = if on { hw.led_on(led) } else { hw.led_off(led) };
    }
}

fn set_gpios<H: Hardware>(hw: &mut H, pins: &[GpioPin], level: Level) {
    for &pin in pins {
        let _ = hw.gpio_set(pin, level);
    }
}

fn set_power<H: Hardware>(hw: &mut H, outputs: &[PowerOutput], on: bool) {
    for &output in outputs {
        let _ = if on { hw.enable(output) } else { hw.disable(output) };
    }
}

pub struct Sequencer<H, D> {
    hw: H,
    delay: D,
    config: Config,
}

impl<H, D> Sequencer<H, D> {
    pub fn new(hw: H, delay: D) -> Self {
        Self::with_config(hw, delay, Config::default())
    }

    pub fn with_config(hw: H, delay: D, config: Config) -> Self {
        Self { hw, delay, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give back the hardware and delay.
    pub fn free(self) -> (H, D) {
        (self.hw, self.delay)
    }
}

impl<H, D> Sequencer<H, D>
where
    H: Hardware,
    D: DelayNs,
{
    /// Boot, check the PMIC link and run `mode` forever.
    pub fn run(&mut self, mode: RunMode) -> ! {
        info!("nPM1300 bring-up, run mode: {}", mode.name());
        if let Err(e) = self.startup() {
            error!("halting: {}", e);
            self.park();
        }
        self.delay.delay_ms(self.config.timing.settle_ms);

        let gap = self.config.timing.repeat_gap_ms;
        match mode {
            RunMode::RgbLeds => {
                info!("repeating RGB LED routine, reset to stop");
                loop {
                    let _ = self.run_routine(Routine::RgbLeds);
                    self.delay.delay_ms(gap);
                }
            }
            RunMode::AllTogether => {
                info!("repeating all-together routine, reset to stop");
                loop {
                    let _ = self.run_routine(Routine::AllTogether);
                    self.delay.delay_ms(gap);
                }
            }
            RunMode::Vout1 => {
                let _ = self.run_routine(Routine::Vout1Enable);
                info!("VOUT1 stays on, reset to exit");
                self.park()
            }
            RunMode::Sequential => {
                self.run_sequential();
                self.heartbeat()
            }
            RunMode::Idle => {
                warn!("no run mode selected, blinking blue LED");
                self.heartbeat()
            }
        }
    }

    /// Check the PMIC link (fatal) and the GPIO controller (warning only).
    pub fn startup(&mut self) -> Result<(), StartupError> {
        if !self.hw.is_ready(Device::Pmic) {
            error!("PMIC not ready, control bus FAILED");
            return Err(StartupError::PmicNotReady);
        }
        info!("PMIC ready, control bus OK");

        if self.hw.is_ready(Device::Gpio) {
            info!("GPIO controller ready");
        } else {
            warn!("GPIO controller not ready, GPIO routines will fail");
        }
        Ok(())
    }

    /// Every routine once in [`Routine::SEQUENCE`] order. Failures are logged and skipped.
    pub fn run_sequential(&mut self) {
        info!("running all routines in sequence");
        self.delay.delay_ms(self.config.timing.lead_in_ms);
        for routine in Routine::SEQUENCE {
            let _ = self.run_routine(routine);
            self.delay.delay_ms(self.config.timing.routine_gap_ms);
        }
        info!("all routines done");
    }

    /// Run one routine and log how it ended.
    pub fn run_routine(&mut self, routine: Routine) -> Result<(), RoutineError<H::Error>> {
        let result = match routine {
            Routine::RgbLeds => self.rgb_leds(),
            Routine::AllTogether => self.all_together(),
            Routine::Gpio1Gpio2 => self.gpio1_gpio2(),
            Routine::Gpio3 => self.gpio3(),
            Routine::Vout1Enable => self.vout1_enable(),
            Routine::LoadSwitch1 => self.load_switch(LoadSwitch::Ls1),
            Routine::LoadSwitch2 => self.load_switch(LoadSwitch::Ls2),
        };
        match &result {
            Ok(()) => info!("PASS {}", routine.name()),
            Err(RoutineError::NotReady(device)) => {
                error!("FAIL {}: {} not ready", routine.name(), device.name())
            }
            Err(RoutineError::Failed { device, op, error }) => error!(
                "FAIL {}: {} {} returned {}",
                routine.name(),
                device.name(),
                op,
                Debug2Format(error)
            ),
        }
        result
    }

    /// Red, green and blue on and off together.
    pub fn rgb_leds(&mut self) -> Result<(), RoutineError<H::Error>> {
        info!("== RGB LED routine ==");
        info!("measure: {}", Routine::RgbLeds.test_points());
        self.require(Device::Leds)?;
        self.cycles("LEDs", |hw| set_leds(hw, true), |hw| set_leds(hw, false));
        Ok(())
    }

    /// LEDs, GPIO1..3, both load switches and VOUT1 toggled in lockstep.
    pub fn all_together(&mut self) -> Result<(), RoutineError<H::Error>> {
        info!("== all together routine ==");
        info!("measure: {}", Routine::AllTogether.test_points());
        for device in [
            Device::Leds,
            Device::Gpio,
            Device::LoadSwitch1,
            Device::LoadSwitch2,
            Device::Vout1,
        ] {
            self.require(device)?;
        }
        self.configure_outputs(&ALL_GPIOS)?;
        self.set_vout1_target()?;
        info!("all outputs configured");

        self.cycles(
            "LEDs + GPIO1,2,3 + LS1,2 + VOUT1",
            |hw| {
                set_leds(hw, true);
                set_gpios(hw, &ALL_GPIOS, Level::High);
                set_power(hw, &ALL_POWER, true);
            },
            |hw| {
                set_leds(hw, false);
                set_gpios(hw, &ALL_GPIOS, Level::Low);
                set_power(hw, &ALL_POWER, false);
            },
        );
        Ok(())
    }

    pub fn gpio1_gpio2(&mut self) -> Result<(), RoutineError<H::Error>> {
        info!("== GPIO1/GPIO2 routine ==");
        info!("measure: {}", Routine::Gpio1Gpio2.test_points());
        self.require(Device::Gpio)?;
        self.configure_outputs(&GPIO_1_2)?;
        self.cycles(
            "GPIO1 & GPIO2",
            |hw| set_gpios(hw, &GPIO_1_2, Level::High),
            |hw| set_gpios(hw, &GPIO_1_2, Level::Low),
        );
        Ok(())
    }

    /// GPIO3 drives EN_BIO.
    pub fn gpio3(&mut self) -> Result<(), RoutineError<H::Error>> {
        info!("== GPIO3 routine ==");
        info!("measure: {}", Routine::Gpio3.test_points());
        self.require(Device::Gpio)?;
        self.configure_outputs(&GPIO_3)?;
        self.cycles(
            "GPIO3",
            |hw| set_gpios(hw, &GPIO_3, Level::High),
            |hw| set_gpios(hw, &GPIO_3, Level::Low),
        );
        Ok(())
    }

    /// Program VOUT1, enable it and hold. The rail is left on afterwards.
    pub fn vout1_enable(&mut self) -> Result<(), RoutineError<H::Error>> {
        info!("== VOUT1 enable routine ==");
        info!("measure: {}", Routine::Vout1Enable.test_points());
        self.require(Device::Vout1)?;
        self.set_vout1_target()?;
        self.hw
            .enable(PowerOutput::Vout1)
            .map_err(|error| RoutineError::Failed {
                device: Device::Vout1,
                op: Operation::Enable,
                error,
            })?;

        let hold = self.config.timing.vout_hold_ms;
        info!(
            "VOUT1 enabled at {} uV, holding {} ms for measurement",
            self.config.vout1_target_uv,
            hold
        );
        self.delay.delay_ms(hold);
        info!("VOUT1 still enabled");
        Ok(())
    }

    /// Cycle one load switch.
    pub fn load_switch(&mut self, switch: LoadSwitch) -> Result<(), RoutineError<H::Error>> {
        let routine = match switch {
            LoadSwitch::Ls1 => Routine::LoadSwitch1,
            LoadSwitch::Ls2 => Routine::LoadSwitch2,
        };
        let output = PowerOutput::from(switch);
        let device = Device::from(switch);
        info!("== {} routine ==", device.name());
        info!("measure: {}", routine.test_points());
        self.require(device)?;
        self.cycles(
            device.name(),
            |hw| set_power(hw, &[output], true),
            |hw| set_power(hw, &[output], false),
        );
        Ok(())
    }

    /// One blue LED blink.
    pub fn heartbeat_once(&mut self) {
        let period = self.config.timing.heartbeat_ms;
        if self.hw.is_ready(Device::Leds) {
            let _ = self.hw.led_on(Led::Blue);
            self.delay.delay_ms(period);
            let _ = self.hw.led_off(Led::Blue);
            self.delay.delay_ms(period);
        } else {
            self.delay.delay_ms(period);
        }
    }

    fn heartbeat(&mut self) -> ! {
        loop {
            self.heartbeat_once();
        }
    }

    /// Sleep forever without touching any output.
    fn park(&mut self) -> ! {
        loop {
            self.delay.delay_ms(self.config.timing.idle_ms);
        }
    }

    fn require(&mut self, device: Device) -> Result<(), RoutineError<H::Error>> {
        if self.hw.is_ready(device) {
            Ok(())
        } else {
            Err(RoutineError::NotReady(device))
        }
    }

    fn configure_outputs(&mut self, pins: &[GpioPin]) -> Result<(), RoutineError<H::Error>> {
        for &pin in pins {
            self.hw
                .gpio_configure_output(pin, Level::Low)
                .map_err(|error| RoutineError::Failed {
                    device: Device::Gpio,
                    op: Operation::ConfigureGpio(pin),
                    error,
                })?;
            debug!("GPIO{} configured as output, low", pin.number());
        }
        Ok(())
    }

    fn set_vout1_target(&mut self) -> Result<(), RoutineError<H::Error>> {
        let uv = self.config.vout1_target_uv;
        self.hw
            .set_voltage(PowerOutput::Vout1, uv, uv)
            .map_err(|error| RoutineError::Failed {
                device: Device::Vout1,
                op: Operation::SetVoltage,
                error,
            })
    }

    fn cycles(&mut self, label: &str, mut on: impl FnMut(&mut H), mut off: impl FnMut(&mut H)) {
        let half = self.config.timing.half_cycle_ms;
        for cycle in 1..=self.config.timing.cycles {
            info!("cycle {}: {} on", cycle, label);
            on(&mut self.hw);
            self.delay.delay_ms(half);

            info!("cycle {}: {} off", cycle, label);
            off(&mut self.hw);
            self.delay.delay_ms(half);
        }
        info!("{} done", label);
    }
}
