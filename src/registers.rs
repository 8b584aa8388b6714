//! Register map and constants for the nPM1300.
//! Every register is addressed by a (base, offset) pair sent ahead of the data byte.

use crate::data_types::Led;

/// Fixed 7-bit I2C address of the nPM1300.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x6B;

/// Peripheral base addresses (upper address byte).
pub mod base {
    pub const BUCK: u8 = 0x04;
    pub const GPIO: u8 = 0x06;
    pub const LDSW: u8 = 0x08;
    pub const LEDDRV: u8 = 0x0A;
}

/// BUCK register offsets. BUCK2 registers sit at the BUCK1 offset + 2 where paired.
pub mod buck {
    pub const BUCK1ENASET: u8 = 0x00;
    pub const BUCK1ENACLR: u8 = 0x01;
    /// BUCK1 output voltage in normal mode.
    pub const BUCK1NORMVOUT: u8 = 0x08;
    /// Selects register (1) or VSET pin (0) as the voltage source, one bit per buck.
    pub const BUCKSWCTRLSEL: u8 = 0x0F;
    pub const BUCKSTATUS: u8 = 0x34;
}

/// GPIO register offsets; add the pin number to reach the per-pin register.
pub mod gpio {
    pub const GPIOMODE: u8 = 0x00;
    pub const GPIOPUEN: u8 = 0x0A;
    pub const GPIOPDEN: u8 = 0x0F;
    pub const GPIOOPENDRAIN: u8 = 0x14;

    /// GPIOMODE value: output driven high.
    pub const MODE_OUTPUT_HIGH: u8 = 8;
    /// GPIOMODE value: output driven low.
    pub const MODE_OUTPUT_LOW: u8 = 9;
}

/// Load switch register offsets.
pub mod ldsw {
    pub const LDSW1ENASET: u8 = 0x00;
    pub const LDSW1ENACLR: u8 = 0x01;
    pub const LDSW2ENASET: u8 = 0x02;
    pub const LDSW2ENACLR: u8 = 0x03;
    pub const LDSWSTATUS: u8 = 0x04;
    /// 0 = load switch, 1 = LDO. LDSW2 at +1.
    pub const LDSW1LDOSEL: u8 = 0x08;
    pub const LDSW2LDOSEL: u8 = 0x09;
}

/// LED driver register offsets.
pub mod leddrv {
    /// LEDDRVnMODESEL at base + n.
    pub const MODESEL: u8 = 0x00;
    /// LEDDRVnSET at base + 2n.
    pub const SET: u8 = 0x03;
    /// LEDDRVnCLR at base + 2n.
    pub const CLR: u8 = 0x04;
}

/// Task registers fire on any write; this is the value written.
pub const TASK_TRIGGER: u8 = 0x01;

/// BUCK1 output range: 1.0 V to 3.3 V in 100 mV steps.
pub const BUCK_VOUT_MIN_UV: u32 = 1_000_000;
pub const BUCK_VOUT_STEP_UV: u32 = 100_000;
pub const BUCK_VOUT_MAX_CODE: u8 = 23;
pub const BUCK_VOUT_MAX_UV: u32 = BUCK_VOUT_MIN_UV + BUCK_VOUT_MAX_CODE as u32 * BUCK_VOUT_STEP_UV;

bitflags::bitflags! {
    /// BUCKSWCTRLSEL bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct BuckSwCtrlBits: u8 {
        /// BUCK1 voltage taken from BUCK1NORMVOUT.
        const BUCK1 = 1 << 0;
        const BUCK2 = 1 << 1;
    }

    /// LDSWSTATUS bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct LdswStatusBits: u8 {
        const LDSW1_PWRUP_LDSW = 1 << 0;
        const LDSW1_PWRUP_LDO  = 1 << 1;
        const LDSW2_PWRUP_LDSW = 1 << 2;
        const LDSW2_PWRUP_LDO  = 1 << 3;
    }
}

/// Lowest BUCK1 code whose voltage lies inside `[min_uv, max_uv]`.
pub fn buck_code_for_window(min_uv: u32, max_uv: u32) -> Option<u8> {
    if min_uv > max_uv || max_uv < BUCK_VOUT_MIN_UV || min_uv > BUCK_VOUT_MAX_UV {
        return None;
    }
    let from_min = min_uv.saturating_sub(BUCK_VOUT_MIN_UV);
    let code = from_min.div_ceil(BUCK_VOUT_STEP_UV);
    if code > BUCK_VOUT_MAX_CODE as u32 {
        return None;
    }
    let code = code as u8;
    (code_to_buck_uv(code) <= max_uv).then_some(code)
}

/// Convert a BUCK1NORMVOUT code to microvolts. Codes above the range clamp to 3.3 V.
pub fn code_to_buck_uv(code: u8) -> u32 {
    let code = code.min(BUCK_VOUT_MAX_CODE);
    BUCK_VOUT_MIN_UV + code as u32 * BUCK_VOUT_STEP_UV
}

/// LEDDRVnSET / LEDDRVnCLR offset for `led`.
pub fn led_task_offset(task: u8, led: Led) -> u8 {
    task + led.index() * 2
}
