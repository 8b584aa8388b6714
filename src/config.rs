//! Run-mode selection and timing for the bring-up sequencer.

use core::str::FromStr;

/// Which routine the firmware runs. Exactly one per boot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunMode {
    /// Repeat the RGB LED routine forever.
    RgbLeds,
    /// Repeat the synchronized all-outputs routine forever.
    AllTogether,
    /// Enable VOUT1 once and keep it powered.
    Vout1,
    /// Every routine once, then the alive blink.
    Sequential,
    /// Nothing selected: alive blink only.
    #[default]
    Idle,
}

impl RunMode {
    /// Mode baked in through `NPM1300_TEST_MODE` at build time; `Idle` when unset or unknown.
    pub fn from_build_env() -> Self {
        option_env!("NPM1300_TEST_MODE")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            RunMode::RgbLeds => "rgb-leds",
            RunMode::AllTogether => "all-together",
            RunMode::Vout1 => "vout1",
            RunMode::Sequential => "sequential",
            RunMode::Idle => "idle",
        }
    }
}

/// Unrecognized run-mode name.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnknownMode;

impl core::fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown run mode")
    }
}

impl FromStr for RunMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [(&str, RunMode); 6] = [
            ("rgb-leds", RunMode::RgbLeds),
            ("all-together", RunMode::AllTogether),
            ("vout1", RunMode::Vout1),
            ("sequential", RunMode::Sequential),
            ("idle", RunMode::Idle),
            ("none", RunMode::Idle),
        ];
        let s = s.trim();
        NAMES
            .iter()
            .find(|(name, _)| {
                name.len() == s.len()
                    && name
                        .bytes()
                        .zip(s.bytes())
                        .all(|(a, b)| a == b.to_ascii_lowercase() || (a == b'-' && b == b'_'))
            })
            .map(|(_, mode)| *mode)
            .ok_or(UnknownMode)
    }
}

/// Routine timing. Delays are in milliseconds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Each on and each off phase of a cyclic routine.
    pub half_cycle_ms: u32,
    /// On/off cycles per cyclic routine.
    pub cycles: u8,
    /// How long VOUT1 is held for measurement after enabling.
    pub vout_hold_ms: u32,
    /// Pause after a successful startup check.
    pub settle_ms: u32,
    /// Pause between repeats in the continuous modes.
    pub repeat_gap_ms: u32,
    /// Pause before the first routine in sequential mode.
    pub lead_in_ms: u32,
    /// Pause after each routine in sequential mode.
    pub routine_gap_ms: u32,
    /// Alive blink on and off phase.
    pub heartbeat_ms: u32,
    /// Sleep slice while parked.
    pub idle_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            half_cycle_ms: 2_000,
            cycles: 5,
            vout_hold_ms: 5_000,
            settle_ms: 1_000,
            repeat_gap_ms: 1_000,
            lead_in_ms: 1_000,
            routine_gap_ms: 2_000,
            heartbeat_ms: 1_000,
            idle_ms: 10_000,
        }
    }
}

/// Sequencer configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub timing: Timing,
    /// VOUT1 target, requested as an exact window.
    pub vout1_target_uv: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            vout1_target_uv: 3_000_000,
        }
    }
}
