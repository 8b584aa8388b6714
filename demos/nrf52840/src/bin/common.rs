#![allow(dead_code)]

use defmt::{info, warn};
use embassy_nrf::{
    peripherals::TWISPI0,
    twim::{self, Twim},
};
use embassy_time::Delay;

use npm1300_bringup::data_types::Device;
use npm1300_bringup::{Hardware, Npm1300};

// nRF52840-DK wired to the nPM1300 companion board:
// - P0.26 = SDA
// - P0.27 = SCL

pub type BoardI2c = Twim<'static, TWISPI0>;

pub struct Board {
    pub i2c: BoardI2c,
    pub delay: Delay,
}

pub fn init_board() -> Board {
    let p = embassy_nrf::init(Default::default());

    let mut cfg = twim::Config::default();
    cfg.frequency = twim::Frequency::K100;
    cfg.sda_pullup = true;
    cfg.scl_pullup = true;
    let i2c = Twim::new(p.TWISPI0, super::Irqs, p.P0_26, p.P0_27, cfg);

    Board { i2c, delay: Delay }
}

/// Initialise the PMIC and report which blocks came up. Failures are left to the routines.
pub fn setup_pmic(i2c: BoardI2c) -> Npm1300<BoardI2c> {
    let mut pmic = Npm1300::new(i2c);
    if let Err(e) = pmic.init() {
        warn!("nPM1300 init incomplete: {:?}", defmt::Debug2Format(&e));
    }
    log_readiness(&mut pmic);
    pmic
}

pub fn log_readiness(pmic: &mut Npm1300<BoardI2c>) {
    for device in [
        Device::Pmic,
        Device::Leds,
        Device::Gpio,
        Device::LoadSwitch1,
        Device::LoadSwitch2,
        Device::Vout1,
    ] {
        if pmic.is_ready(device) {
            info!("{} ready", device.name());
        } else {
            warn!("{} NOT ready", device.name());
        }
    }
}
