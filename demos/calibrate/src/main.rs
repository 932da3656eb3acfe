use adc16_emulator::{EmulatedBoard, LaneModel};
use anyhow::Result;
use libadc16_rs::{Adc16, AdcConfig, CalibrationSettings, Chip, DemuxMode, Lane};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .filter_module("adc16_emulator", log::LevelFilter::Info)
        .init();

    // a SNAP with one lane sampling at the edge of its eye
    let board = EmulatedBoard::snap()
        .with_lane(Chip::B, Lane::In3A, LaneModel::new().eye(0, 12).shifted_eye(11, 27))
        .with_lane(Chip::C, Lane::In1B, LaneModel::new().sync_after(5));
    let mut adc = Adc16::new(board)?;
    adc.set_settings(CalibrationSettings {
        pattern_settle: Duration::from_millis(10),
        ..Default::default()
    });

    let mhz = adc.estimate_board_clock(Duration::from_millis(100))?;
    log::info!("board clock {mhz:.1} MHz");

    let config = AdcConfig {
        demux: DemuxMode::Demux2,
        ..Default::default()
    };
    adc.initialize(&config)?;
    let report = adc.calibrate_all_chips(&config)?;

    for chip in &report.calibrated {
        let taps: Vec<u8> = chip.taps.iter().map(|t| t.value()).collect();
        log::info!("chip {}: taps {taps:?} slips {:?}", chip.chip, chip.slips);
    }
    for (chip, e) in &report.failed {
        log::error!("chip {chip}: {e}");
    }
    for (chip, clean) in adc.check_calibration()? {
        log::info!("chip {chip}: deskew clean {clean}");
    }

    let snapshot = adc.read_snapshot(Chip::A)?;
    for (input, samples) in snapshot.demux(config.demux).iter().enumerate() {
        log::debug!("input {input}: {:?}", &samples[..8]);
    }

    Ok(())
}
