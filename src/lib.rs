//! nPM1300 bring-up harness
//!
//! Drives the LEDs, PMIC GPIOs, load switches and BUCK1 (VOUT1) of an nPM1300
//! companion board through fixed on/off patterns so the outputs can be checked
//! with a meter. The [`Sequencer`] only talks to a [`Hardware`] implementation;
//! [`Npm1300`] provides one over I2C. no-std, optional async register API,
//! defmt logging behind the `defmt` feature.

#![no_std]

#[macro_use]
mod fmt;

pub mod config;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod hardware;
pub mod registers;
pub mod sequencer;

pub use config::{Config, RunMode, Timing};
pub use driver::Npm1300;
pub use error::{Error, RoutineError, StartupError};
pub use hardware::Hardware;
pub use registers::DEFAULT_I2C_ADDRESS;
pub use sequencer::{Routine, Sequencer};
