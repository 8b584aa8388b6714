//! Data types shared by the nPM1300 backend and the bring-up sequencer.

/// Logical devices the harness talks to. All of them live inside the nPM1300.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Device {
    /// Control bus link to the PMIC itself.
    Pmic,
    /// LED driver bank (LEDDRV0..2).
    Leds,
    /// PMIC-hosted GPIO controller.
    Gpio,
    LoadSwitch1,
    LoadSwitch2,
    /// BUCK1 output, routed to VOUT1 on the companion board.
    Vout1,
}

impl Device {
    /// Short name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Device::Pmic => "PMIC",
            Device::Leds => "LED driver",
            Device::Gpio => "GPIO controller",
            Device::LoadSwitch1 => "LS1",
            Device::LoadSwitch2 => "LS2",
            Device::Vout1 => "VOUT1",
        }
    }
}

/// LED driver channel. Discriminants are the LEDDRV index.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Led {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Led {
    pub const ALL: [Led; 3] = [Led::Red, Led::Green, Led::Blue];

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// LEDDRVnMODESEL values.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LedMode {
    /// Lit by the charger on error.
    ChargerError = 0,
    /// Lit by the charger while charging.
    Charging = 1,
    /// Driven through LEDDRVnSET / LEDDRVnCLR.
    Host = 2,
}

/// Output level of a PMIC GPIO.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// A PMIC GPIO pin number (GPIO0..GPIO4).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GpioPin(u8);

impl GpioPin {
    pub const GPIO1: GpioPin = GpioPin(1);
    pub const GPIO2: GpioPin = GpioPin(2);
    pub const GPIO3: GpioPin = GpioPin(3);

    /// Number of GPIOs on the nPM1300.
    pub const COUNT: u8 = 5;

    /// Returns `None` for pins the PMIC does not have.
    pub fn new(number: u8) -> Option<Self> {
        (number < Self::COUNT).then_some(GpioPin(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

/// Switchable power outputs.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerOutput {
    LoadSwitch1,
    LoadSwitch2,
    Vout1,
}

impl From<PowerOutput> for Device {
    fn from(output: PowerOutput) -> Self {
        match output {
            PowerOutput::LoadSwitch1 => Device::LoadSwitch1,
            PowerOutput::LoadSwitch2 => Device::LoadSwitch2,
            PowerOutput::Vout1 => Device::Vout1,
        }
    }
}

/// One of the two LDSW load switches.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadSwitch {
    Ls1,
    Ls2,
}

impl From<LoadSwitch> for PowerOutput {
    fn from(switch: LoadSwitch) -> Self {
        match switch {
            LoadSwitch::Ls1 => PowerOutput::LoadSwitch1,
            LoadSwitch::Ls2 => PowerOutput::LoadSwitch2,
        }
    }
}

impl From<LoadSwitch> for Device {
    fn from(switch: LoadSwitch) -> Self {
        Device::from(PowerOutput::from(switch))
    }
}
