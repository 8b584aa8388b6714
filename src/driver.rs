//! nPM1300 register backend.
//! Blocking I2C helpers plus the [`Hardware`] implementation; the `async` feature mirrors the API.

use crate::data_types::{Device, GpioPin, Led, LedMode, Level, PowerOutput};
use crate::error::Error;
use crate::hardware::Hardware;
use crate::registers::{
    base, buck, buck_code_for_window, code_to_buck_uv, gpio, led_task_offset, ldsw, leddrv, BuckSwCtrlBits,
    LdswStatusBits, DEFAULT_I2C_ADDRESS, TASK_TRIGGER,
};

bitflags::bitflags! {
    /// Devices that came up during `init`.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct ReadyFlags: u8 {
        const PMIC  = 1 << 0;
        const LEDS  = 1 << 1;
        const GPIO  = 1 << 2;
        const LDSW1 = 1 << 3;
        const LDSW2 = 1 << 4;
        const VOUT1 = 1 << 5;
    }
}

impl From<Device> for ReadyFlags {
    fn from(device: Device) -> Self {
        match device {
            Device::Pmic => ReadyFlags::PMIC,
            Device::Leds => ReadyFlags::LEDS,
            Device::Gpio => ReadyFlags::GPIO,
            Device::LoadSwitch1 => ReadyFlags::LDSW1,
            Device::LoadSwitch2 => ReadyFlags::LDSW2,
            Device::Vout1 => ReadyFlags::VOUT1,
        }
    }
}

/// (base, offset) of the task register that switches `output` on.
fn enable_task(output: PowerOutput) -> (u8, u8) {
    match output {
        PowerOutput::LoadSwitch1 => (base::LDSW, ldsw::LDSW1ENASET),
        PowerOutput::LoadSwitch2 => (base::LDSW, ldsw::LDSW2ENASET),
        PowerOutput::Vout1 => (base::BUCK, buck::BUCK1ENASET),
    }
}

/// (base, offset) of the task register that switches `output` off.
fn disable_task(output: PowerOutput) -> (u8, u8) {
    match output {
        PowerOutput::LoadSwitch1 => (base::LDSW, ldsw::LDSW1ENACLR),
        PowerOutput::LoadSwitch2 => (base::LDSW, ldsw::LDSW2ENACLR),
        PowerOutput::Vout1 => (base::BUCK, buck::BUCK1ENACLR),
    }
}

fn gpio_mode(level: Level) -> u8 {
    match level {
        Level::High => gpio::MODE_OUTPUT_HIGH,
        Level::Low => gpio::MODE_OUTPUT_LOW,
    }
}

/// nPM1300 driver.
pub struct Npm1300<I2C> {
    i2c: I2C,
    address: u8,
    ready: ReadyFlags,
}

impl<I2C> Npm1300<I2C> {
    /// Create a new driver instance with the fixed nPM1300 address (0x6B).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_I2C_ADDRESS)
    }

    /// Create a new driver instance with a custom I2C address (bus translators, muxes).
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            ready: ReadyFlags::empty(),
        }
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the bus.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Npm1300<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Probe the PMIC and bring up the LED drivers and load switches.
    ///
    /// Readiness is recorded per device, so a failing LED bank does not mask
    /// working load switches. The first error is returned.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.ready = ReadyFlags::empty();
        self.probe()?;
        // GPIO and BUCK1 need no setup beyond a live bus.
        self.ready
            .insert(ReadyFlags::PMIC | ReadyFlags::GPIO | ReadyFlags::VOUT1);

        let mut result = Ok(());
        match Led::ALL
            .iter()
            .try_for_each(|led| self.set_led_mode(*led, LedMode::Host))
        {
            Ok(()) => self.ready.insert(ReadyFlags::LEDS),
            Err(e) => result = result.and(Err(e)),
        }
        match self.write_reg(base::LDSW, ldsw::LDSW1LDOSEL, 0) {
            Ok(()) => self.ready.insert(ReadyFlags::LDSW1),
            Err(e) => result = result.and(Err(e)),
        }
        match self.write_reg(base::LDSW, ldsw::LDSW2LDOSEL, 0) {
            Ok(()) => self.ready.insert(ReadyFlags::LDSW2),
            Err(e) => result = result.and(Err(e)),
        }
        result
    }

    /// Check that the PMIC answers on the bus.
    pub fn probe(&mut self) -> Result<(), Error<I2C::Error>> {
        self.read_reg(base::BUCK, buck::BUCKSTATUS).map(|_| ())
    }

    /// Write a single register.
    pub fn write_reg(&mut self, base: u8, offset: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[base, offset, value])
            .map_err(Error::I2c)
    }

    /// Read a single register.
    pub fn read_reg(&mut self, base: u8, offset: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[base, offset], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    /// Update masked bits in a register (read-modify-write).
    pub fn update_reg(&mut self, base: u8, offset: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(base, offset)?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg(base, offset, new)
    }

    pub fn set_led_mode(&mut self, led: Led, mode: LedMode) -> Result<(), Error<I2C::Error>> {
        self.write_reg(base::LEDDRV, leddrv::MODESEL + led.index(), mode as u8)
    }

    /// Light a host-controlled LED.
    pub fn led_on(&mut self, led: Led) -> Result<(), Error<I2C::Error>> {
        self.write_reg(base::LEDDRV, led_task_offset(leddrv::SET, led), TASK_TRIGGER)
    }

    pub fn led_off(&mut self, led: Led) -> Result<(), Error<I2C::Error>> {
        self.write_reg(base::LEDDRV, led_task_offset(leddrv::CLR, led), TASK_TRIGGER)
    }

    /// Configure `pin` as a push-pull output without pull resistors.
    pub fn gpio_configure_output(&mut self, pin: GpioPin, initial: Level) -> Result<(), Error<I2C::Error>> {
        let n = pin.number();
        self.write_reg(base::GPIO, gpio::GPIOMODE + n, gpio_mode(initial))?;
        self.write_reg(base::GPIO, gpio::GPIOPUEN + n, 0)?;
        self.write_reg(base::GPIO, gpio::GPIOPDEN + n, 0)?;
        self.write_reg(base::GPIO, gpio::GPIOOPENDRAIN + n, 0)
    }

    pub fn gpio_set(&mut self, pin: GpioPin, level: Level) -> Result<(), Error<I2C::Error>> {
        self.write_reg(base::GPIO, gpio::GPIOMODE + pin.number(), gpio_mode(level))
    }

    /// Trigger the enable task of a load switch or BUCK1.
    pub fn enable_output(&mut self, output: PowerOutput) -> Result<(), Error<I2C::Error>> {
        let (base, offset) = enable_task(output);
        self.write_reg(base, offset, TASK_TRIGGER)
    }

    pub fn disable_output(&mut self, output: PowerOutput) -> Result<(), Error<I2C::Error>> {
        let (base, offset) = disable_task(output);
        self.write_reg(base, offset, TASK_TRIGGER)
    }

    /// Read LDSWSTATUS.
    pub fn ldsw_status(&mut self) -> Result<LdswStatusBits, Error<I2C::Error>> {
        let val = self.read_reg(base::LDSW, ldsw::LDSWSTATUS)?;
        Ok(LdswStatusBits::from_bits_truncate(val))
    }

    /// Program BUCK1 to the lowest step inside `[min_uv, max_uv]` and hand voltage control to the register.
    pub fn buck1_set_voltage(&mut self, min_uv: u32, max_uv: u32) -> Result<(), Error<I2C::Error>> {
        let code = buck_code_for_window(min_uv, max_uv).ok_or(Error::OutOfRange)?;
        self.write_reg(base::BUCK, buck::BUCK1NORMVOUT, code)?;
        let sel = BuckSwCtrlBits::BUCK1.bits();
        self.update_reg(base::BUCK, buck::BUCKSWCTRLSEL, sel, sel)
    }

    /// Read back the programmed BUCK1 voltage (µV).
    pub fn buck1_voltage_uv(&mut self) -> Result<u32, Error<I2C::Error>> {
        let code = self.read_reg(base::BUCK, buck::BUCK1NORMVOUT)?;
        Ok(code_to_buck_uv(code))
    }
}

impl<I2C> Hardware for Npm1300<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = Error<I2C::Error>;

    fn is_ready(&mut self, device: Device) -> bool {
        self.ready.contains(ReadyFlags::from(device))
    }

    fn led_on(&mut self, led: Led) -> Result<(), Self::Error> {
        Npm1300::led_on(self, led)
    }

    fn led_off(&mut self, led: Led) -> Result<(), Self::Error> {
        Npm1300::led_off(self, led)
    }

    fn gpio_configure_output(&mut self, pin: GpioPin, initial: Level) -> Result<(), Self::Error> {
        Npm1300::gpio_configure_output(self, pin, initial)
    }

    fn gpio_set(&mut self, pin: GpioPin, level: Level) -> Result<(), Self::Error> {
        Npm1300::gpio_set(self, pin, level)
    }

    fn enable(&mut self, output: PowerOutput) -> Result<(), Self::Error> {
        self.enable_output(output)
    }

    fn disable(&mut self, output: PowerOutput) -> Result<(), Self::Error> {
        self.disable_output(output)
    }

    fn set_voltage(&mut self, output: PowerOutput, min_uv: u32, max_uv: u32) -> Result<(), Self::Error> {
        match output {
            PowerOutput::Vout1 => self.buck1_set_voltage(min_uv, max_uv),
            // Load switches pass their input through.
            PowerOutput::LoadSwitch1 | PowerOutput::LoadSwitch2 => Err(Error::InvalidConfig),
        }
    }
}

#[cfg(feature = "async")]
impl<I2C> Npm1300<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Async version of [`init`](Self::init).
    pub async fn init_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.ready = ReadyFlags::empty();
        self.probe_async().await?;
        self.ready
            .insert(ReadyFlags::PMIC | ReadyFlags::GPIO | ReadyFlags::VOUT1);

        let mut result = Ok(());
        let mut leds = Ok(());
        for led in Led::ALL {
            leds = self.set_led_mode_async(led, LedMode::Host).await;
            if leds.is_err() {
                break;
            }
        }
        match leds {
            Ok(()) => self.ready.insert(ReadyFlags::LEDS),
            Err(e) => result = result.and(Err(e)),
        }
        match self.write_reg_async(base::LDSW, ldsw::LDSW1LDOSEL, 0).await {
            Ok(()) => self.ready.insert(ReadyFlags::LDSW1),
            Err(e) => result = result.and(Err(e)),
        }
        match self.write_reg_async(base::LDSW, ldsw::LDSW2LDOSEL, 0).await {
            Ok(()) => self.ready.insert(ReadyFlags::LDSW2),
            Err(e) => result = result.and(Err(e)),
        }
        result
    }

    /// Whether `init_async` brought `device` up.
    pub fn device_ready(&self, device: Device) -> bool {
        self.ready.contains(ReadyFlags::from(device))
    }

    pub async fn probe_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.read_reg_async(base::BUCK, buck::BUCKSTATUS).await.map(|_| ())
    }

    pub async fn write_reg_async(&mut self, base: u8, offset: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[base, offset, value])
            .await
            .map_err(Error::I2c)
    }

    pub async fn read_reg_async(&mut self, base: u8, offset: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[base, offset], &mut buf)
            .await
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    pub async fn update_reg_async(&mut self, base: u8, offset: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg_async(base, offset).await?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg_async(base, offset, new).await
    }

    pub async fn set_led_mode_async(&mut self, led: Led, mode: LedMode) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(base::LEDDRV, leddrv::MODESEL + led.index(), mode as u8)
            .await
    }

    pub async fn led_on_async(&mut self, led: Led) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(base::LEDDRV, led_task_offset(leddrv::SET, led), TASK_TRIGGER)
            .await
    }

    pub async fn led_off_async(&mut self, led: Led) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(base::LEDDRV, led_task_offset(leddrv::CLR, led), TASK_TRIGGER)
            .await
    }

    pub async fn gpio_configure_output_async(&mut self, pin: GpioPin, initial: Level) -> Result<(), Error<I2C::Error>> {
        let n = pin.number();
        self.write_reg_async(base::GPIO, gpio::GPIOMODE + n, gpio_mode(initial))
            .await?;
        self.write_reg_async(base::GPIO, gpio::GPIOPUEN + n, 0).await?;
        self.write_reg_async(base::GPIO, gpio::GPIOPDEN + n, 0).await?;
        self.write_reg_async(base::GPIO, gpio::GPIOOPENDRAIN + n, 0).await
    }

    pub async fn gpio_set_async(&mut self, pin: GpioPin, level: Level) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(base::GPIO, gpio::GPIOMODE + pin.number(), gpio_mode(level))
            .await
    }

    pub async fn enable_output_async(&mut self, output: PowerOutput) -> Result<(), Error<I2C::Error>> {
        let (base, offset) = enable_task(output);
        self.write_reg_async(base, offset, TASK_TRIGGER).await
    }

    pub async fn disable_output_async(&mut self, output: PowerOutput) -> Result<(), Error<I2C::Error>> {
        let (base, offset) = disable_task(output);
        self.write_reg_async(base, offset, TASK_TRIGGER).await
    }

    pub async fn ldsw_status_async(&mut self) -> Result<LdswStatusBits, Error<I2C::Error>> {
        let val = self.read_reg_async(base::LDSW, ldsw::LDSWSTATUS).await?;
        Ok(LdswStatusBits::from_bits_truncate(val))
    }

    pub async fn buck1_set_voltage_async(&mut self, min_uv: u32, max_uv: u32) -> Result<(), Error<I2C::Error>> {
        let code = buck_code_for_window(min_uv, max_uv).ok_or(Error::OutOfRange)?;
        self.write_reg_async(base::BUCK, buck::BUCK1NORMVOUT, code).await?;
        let sel = BuckSwCtrlBits::BUCK1.bits();
        self.update_reg_async(base::BUCK, buck::BUCKSWCTRLSEL, sel, sel)
            .await
    }

    pub async fn buck1_voltage_uv_async(&mut self) -> Result<u32, Error<I2C::Error>> {
        let code = self.read_reg_async(base::BUCK, buck::BUCK1NORMVOUT).await?;
        Ok(code_to_buck_uv(code))
    }
}
