//! Error definitions for the nPM1300 backend and the bring-up routines.

use crate::data_types::{Device, GpioPin};

/// Register backend errors.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Pin, channel or voltage window the PMIC cannot represent.
    OutOfRange,
    /// Operation not supported by the selected output.
    InvalidConfig,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::OutOfRange => write!(f, "parameter out of range"),
            Error::InvalidConfig => write!(f, "operation not supported on this output"),
        }
    }
}

/// A checked hardware call made by a routine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    ConfigureGpio(GpioPin),
    SetVoltage,
    Enable,
}

/// Why a bring-up routine stopped early. Sibling routines are unaffected.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq)]
pub enum RoutineError<E> {
    /// A device the routine needs did not come up; nothing was touched.
    NotReady(Device),
    /// A configuration call returned an error; later steps were skipped.
    Failed { device: Device, op: Operation, error: E },
}

impl<E: core::fmt::Debug> core::fmt::Display for RoutineError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoutineError::NotReady(device) => write!(f, "{} not ready", device.name()),
            RoutineError::Failed { device, op, error } => {
                write!(f, "{} {:?} failed: {:?}", device.name(), op, error)
            }
        }
    }
}

/// Fatal startup condition: nothing past this point may run.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartupError {
    PmicNotReady,
}

impl core::fmt::Display for StartupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StartupError::PmicNotReady => write!(f, "PMIC not ready, control bus down"),
        }
    }
}
