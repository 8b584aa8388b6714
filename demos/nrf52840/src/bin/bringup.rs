#![no_std]
#![no_main]

// nRF52840 + nPM1300 bring-up firmware. The run mode is fixed at build time:
// Build: NPM1300_TEST_MODE=all-together cargo build --release --features hw --bin bringup
// Flash: cargo run --release --features hw --bin bringup

use defmt::info;
use embassy_nrf::{bind_interrupts, peripherals, twim};
use {defmt_rtt as _, panic_probe as _};

mod common;
use common::{init_board, setup_pmic};
use npm1300_bringup::{RunMode, Sequencer};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("========================================");
    info!("  nPM1300 bring-up (P0.26/P0.27 TWIM0)");
    info!("========================================");

    let board = init_board();
    let pmic = setup_pmic(board.i2c);

    let mode = RunMode::from_build_env();
    let mut sequencer = Sequencer::new(pmic, board.delay);
    sequencer.run(mode)
}
