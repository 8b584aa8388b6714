//! Capability interface the bring-up sequencer drives.
//!
//! The sequencer never touches a bus directly: it asks a [`Hardware`]
//! implementation whether a device is up and to flip outputs. The nPM1300
//! register backend implements it for real boards; tests substitute a
//! recording fake.

use crate::data_types::{Device, GpioPin, Led, Level, PowerOutput};

pub trait Hardware {
    type Error: core::fmt::Debug;

    /// Whether `device` finished initialisation and can be driven.
    fn is_ready(&mut self, device: Device) -> bool;

    fn led_on(&mut self, led: Led) -> Result<(), Self::Error>;

    fn led_off(&mut self, led: Led) -> Result<(), Self::Error>;

    /// Configure `pin` as a push-pull output starting at `initial`.
    fn gpio_configure_output(&mut self, pin: GpioPin, initial: Level) -> Result<(), Self::Error>;

    fn gpio_set(&mut self, pin: GpioPin, level: Level) -> Result<(), Self::Error>;

    fn enable(&mut self, output: PowerOutput) -> Result<(), Self::Error>;

    fn disable(&mut self, output: PowerOutput) -> Result<(), Self::Error>;

    /// Request an output voltage within `[min_uv, max_uv]`.
    fn set_voltage(&mut self, output: PowerOutput, min_uv: u32, max_uv: u32) -> Result<(), Self::Error>;
}

impl<T: Hardware + ?Sized> Hardware for &mut T {
    type Error = T::Error;

    fn is_ready(&mut self, device: Device) -> bool {
        (**self).is_ready(device)
    }

    fn led_on(&mut self, led: Led) -> Result<(), Self::Error> {
        (**self).led_on(led)
    }

    fn led_off(&mut self, led: Led) -> Result<(), Self::Error> {
        (**self).led_off(led)
    }

    fn gpio_configure_output(&mut self, pin: GpioPin, initial: Level) -> Result<(), Self::Error> {
        (**self).gpio_configure_output(pin, initial)
    }

    fn gpio_set(&mut self, pin: GpioPin, level: Level) -> Result<(), Self::Error> {
        (**self).gpio_set(pin, level)
    }

    fn enable(&mut self, output: PowerOutput) -> Result<(), Self::Error> {
        (**self).enable(output)
    }

    fn disable(&mut self, output: PowerOutput) -> Result<(), Self::Error> {
        (**self).disable(output)
    }

    fn set_voltage(&mut self, output: PowerOutput, min_uv: u32, max_uv: u32) -> Result<(), Self::Error> {
        (**self).set_voltage(output, min_uv, max_uv)
    }
}
