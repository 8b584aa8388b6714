#![no_std]
#![no_main]

// Read-only health check: probes the nPM1300, dumps LDSW status and the BUCK1
// setpoint, then blinks the blue LED. Touches no rail.

use defmt::{info, warn};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use {defmt_rtt as _, panic_probe as _};

mod common;
use common::{init_board, setup_pmic};
use npm1300_bringup::data_types::{Device, Led};
use npm1300_bringup::registers::LdswStatusBits;
use npm1300_bringup::{Hardware, Sequencer};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("nPM1300 probe (P0.26/P0.27 TWIM0)");
    let board = init_board();
    let mut pmic = setup_pmic(board.i2c);

    match pmic.ldsw_status() {
        Ok(status) => info!(
            "LDSW1 on:{} LDSW2 on:{}",
            status.contains(LdswStatusBits::LDSW1_PWRUP_LDSW),
            status.contains(LdswStatusBits::LDSW2_PWRUP_LDSW)
        ),
        Err(e) => warn!("read LDSWSTATUS failed: {:?}", defmt::Debug2Format(&e)),
    }
    match pmic.buck1_voltage_uv() {
        Ok(uv) => info!("BUCK1 setpoint {} uV", uv),
        Err(e) => warn!("read BUCK1NORMVOUT failed: {:?}", defmt::Debug2Format(&e)),
    }
    if pmic.is_ready(Device::Leds) {
        let _ = pmic.led_off(Led::Red);
        let _ = pmic.led_off(Led::Green);
    }

    let mut sequencer = Sequencer::new(pmic, board.delay);
    loop {
        sequencer.heartbeat_once();
    }
}
