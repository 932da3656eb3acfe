#![allow(dead_code)]
/// This module has been created using mod.rs in a subfolder, instead of just creating a common.rs under tests
/// This is due to the test runner then not searching for runnable tests in mod.rs
/// https://doc.rust-lang.org/rust-by-example/testing/integration_testing.html
use adc16_emulator::EmulatedBoard;
use libadc16_rs::{Adc16, CalibrationSettings};
use std::time::Duration;

/// Calibration settings without the pattern settle delay.
pub fn fast_settings() -> CalibrationSettings {
    CalibrationSettings {
        pattern_settle: Duration::ZERO,
        ..Default::default()
    }
}

pub fn adc16(board: EmulatedBoard) -> Adc16<EmulatedBoard> {
    Adc16::with_settings(board, fast_settings()).unwrap()
}

pub fn logging_init(module: &str) {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Error)
        .filter_module(module, log::LevelFilter::Trace)
        .try_init();
}

/// `(word_offset, value)` of every recorded bus write.
pub fn control_writes(board: &EmulatedBoard) -> Vec<(u32, u32)> {
    board
        .writes()
        .iter()
        .map(|w| (w.word_offset, w.value))
        .collect()
}
