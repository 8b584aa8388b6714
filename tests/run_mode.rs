use npm1300_bringup::config::UnknownMode;
use npm1300_bringup::{Config, RunMode, Timing};

#[test]
fn parses_mode_names() {
    assert_eq!("rgb-leds".parse::<RunMode>(), Ok(RunMode::RgbLeds));
    assert_eq!("all-together".parse::<RunMode>(), Ok(RunMode::AllTogether));
    assert_eq!("vout1".parse::<RunMode>(), Ok(RunMode::Vout1));
    assert_eq!("sequential".parse::<RunMode>(), Ok(RunMode::Sequential));
    assert_eq!("idle".parse::<RunMode>(), Ok(RunMode::Idle));
    assert_eq!("none".parse::<RunMode>(), Ok(RunMode::Idle));
}

#[test]
fn parsing_ignores_case_underscores_and_padding() {
    assert_eq!("ALL_TOGETHER".parse::<RunMode>(), Ok(RunMode::AllTogether));
    assert_eq!(" Rgb_Leds\n".parse::<RunMode>(), Ok(RunMode::RgbLeds));
}

#[test]
fn unknown_names_are_errors() {
    assert_eq!("all".parse::<RunMode>(), Err(UnknownMode));
    assert_eq!("vout2".parse::<RunMode>(), Err(UnknownMode));
    assert_eq!("".parse::<RunMode>(), Err(UnknownMode));
}

#[test]
fn names_round_trip() {
    for mode in [
        RunMode::RgbLeds,
        RunMode::AllTogether,
        RunMode::Vout1,
        RunMode::Sequential,
        RunMode::Idle,
    ] {
        assert_eq!(mode.name().parse::<RunMode>(), Ok(mode));
    }
}

#[test]
fn no_selection_means_idle() {
    assert_eq!(RunMode::default(), RunMode::Idle);
    if option_env!("NPM1300_TEST_MODE").is_none() {
        assert_eq!(RunMode::from_build_env(), RunMode::Idle);
    }
}

#[test]
fn default_timing_matches_bench_procedure() {
    let config = Config::default();
    assert_eq!(config.vout1_target_uv, 3_000_000);
    assert_eq!(
        config.timing,
        Timing {
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
    );
}
