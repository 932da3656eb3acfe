mod common;

use crate::common::*;

use adc16_emulator::{EmulatedBoard, LaneModel};
use libadc16_rs::adc16::SNAPSHOT_RAM_PREFIX;
use libadc16_rs::{
    Adc16, AdcConfig, CancelToken, Chip, ChipSelect, DemuxMode, Error, Lane, RegisterBus, Result,
    Tap,
};
use std::collections::BTreeSet;
use std::time::Duration;

/// Emulated board whose `fail_at`-th snapshot read either drops the link or,
/// with a token set, fires the cancellation.
struct FailingSnapshot {
    board: EmulatedBoard,
    reads: usize,
    fail_at: usize,
    cancel: Option<CancelToken>,
    writes_at_failure: Option<usize>,
}

impl FailingSnapshot {
    fn new(fail_at: usize) -> Self {
        Self {
            board: EmulatedBoard::snap(),
            reads: 0,
            fail_at,
            cancel: None,
            writes_at_failure: None,
        }
    }

    fn writes_after_failure(&self) -> Option<usize> {
        self.writes_at_failure.map(|at| self.board.writes().len() - at)
    }
}

impl RegisterBus for FailingSnapshot {
    fn write_register(&mut self, name: &str, value: u32, word_offset: u32) -> Result<()> {
        self.board.write_register(name, value, word_offset)
    }

    fn read_memory(&mut self, region: &str, byte_count: usize, offset: usize) -> Result<Vec<u8>> {
        if region.starts_with(SNAPSHOT_RAM_PREFIX) {
            self.reads += 1;
            if self.reads == self.fail_at {
                self.writes_at_failure = Some(self.board.writes().len());
                match &self.cancel {
                    Some(token) => token.cancel(),
                    None => return Err(Error::Transport("link dropped".to_string())),
                }
            }
        }
        self.board.read_memory(region, byte_count, offset)
    }

    fn is_connected(&self) -> bool {
        self.board.is_connected()
    }

    fn list_registers(&mut self) -> Result<BTreeSet<String>> {
        self.board.list_registers()
    }
}

fn demux2() -> AdcConfig {
    AdcConfig {
        demux: DemuxMode::Demux2,
        ..Default::default()
    }
}

#[test]
fn status_probes() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    assert!(adc.clock_locked()?);
    assert_eq!(adc.supported_chips()?, 3);
    assert_eq!(adc.revision()?, 2);

    adc.bus_mut().set_lock_bits(0);
    assert!(!adc.clock_locked()?);
    Ok(())
}

#[test]
fn design_without_controller_is_rejected() {
    assert!(matches!(
        Adc16::new(EmulatedBoard::snap().without_adc16()),
        Err(Error::NotAdc16Design)
    ));
}

#[test]
fn initialize_writes_operating_mode() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(EmulatedBoard::snap());
    let config = AdcConfig {
        gain: 3,
        ..Default::default()
    };
    adc.initialize(&config)?;

    let board = adc.bus();
    for chip in Chip::SNAP {
        assert_eq!(board.adc_register(chip, 0x31), 4);
        assert_eq!(board.adc_register(chip, 0x3a), 0x0402);
        assert_eq!(board.adc_register(chip, 0x3b), 0x1008);
        assert_eq!(board.adc_register(chip, 0x2a), 0x3333);
        assert_eq!(board.adc_register(chip, 0x0f), 0);
    }
    let addresses: Vec<u8> = board.transactions().iter().map(|t| t.address).collect();
    assert_eq!(addresses, [0x00, 0x31, 0x3a, 0x3b, 0x2a, 0x0f, 0x0f]);
    assert_eq!(board.fpga_demux(), DemuxMode::Demux1);
    Ok(())
}

#[test]
fn demux4_routes_input_one_everywhere() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    adc.set_demux(DemuxMode::Demux4)?;

    assert_eq!(adc.bus().adc_register(Chip::A, 0x31), 1);
    assert_eq!(adc.bus().adc_register(Chip::A, 0x3a), 0x0202);
    assert_eq!(adc.bus().adc_register(Chip::A, 0x3b), 0x0202);
    assert_eq!(adc.bus().fpga_demux(), DemuxMode::Demux4);
    Ok(())
}

#[test]
fn unselected_chip_is_rejected() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    let config = AdcConfig {
        chips: ChipSelect::single(Chip::B),
        ..Default::default()
    };

    assert!(matches!(
        adc.calibrate(Chip::A, &config),
        Err(Error::InvalidArgument(_))
    ));
    assert!(adc.bus().writes().is_empty());
    assert!(adc.calibrate(Chip::B, &config).is_ok());
    Ok(())
}

#[test]
fn unlocked_clock_blocks_calibration() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(EmulatedBoard::snap().with_lock_bits(0));
    assert_eq!(
        adc.calibrate(Chip::A, &AdcConfig::default()),
        Err(Error::ClockNotLocked { lock_bits: 0 })
    );
    assert!(matches!(
        adc.calibrate_all_chips(&AdcConfig::default()),
        Err(Error::ClockNotLocked { lock_bits: 0 })
    ));
    assert!(adc.bus().writes().is_empty());
    Ok(())
}

#[test]
fn calibrate_restores_operating_demux() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(
        EmulatedBoard::snap().with_lane(Chip::A, Lane::In2A, LaneModel::new().eye(10, 25)),
    );
    let calibration = adc.calibrate(Chip::A, &demux2())?;

    assert_eq!(calibration.chip, Chip::A);
    assert_eq!(calibration.taps[Lane::In2A.offset()], Tap::new(17)?);
    assert_eq!(calibration.slips, [0; 8]);

    let board = adc.bus();
    assert_eq!(board.fpga_demux(), DemuxMode::Demux2);
    assert_eq!(board.adc_register(Chip::A, 0x31), 2);
    assert_eq!(board.adc_register(Chip::A, 0x25), 0);
    assert_eq!(board.adc_register(Chip::A, 0x45), 0);
    Ok(())
}

#[test]
fn failed_calibration_still_restores_demux() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(
        EmulatedBoard::snap().with_lane(Chip::B, Lane::In1A, LaneModel::new().closed()),
    );
    assert!(matches!(
        adc.calibrate(Chip::B, &demux2()),
        Err(Error::CalibrationWindowEmpty { chip: Chip::B, .. })
    ));
    assert_eq!(adc.bus().fpga_demux(), DemuxMode::Demux2);
    assert_eq!(adc.bus().adc_register(Chip::B, 0x45), 0);
    Ok(())
}

#[test]
fn edge_slip_is_followed_by_sync() -> Result<()> {
    logging_init("adc16_calibrate");

    let model = LaneModel::new().eye(0, 31);
    let mut adc = adc16(EmulatedBoard::snap().with_lane(Chip::C, Lane::In3A, model));
    let calibration = adc.calibrate(Chip::C, &AdcConfig::default())?;

    // one slip from the edge check, seven more to wrap the frame back
    assert_eq!(calibration.taps[Lane::In3A.offset()], Tap::new(15)?);
    assert_eq!(calibration.slips[Lane::In3A.offset()], 7);
    assert_eq!(adc.bus().slips(Chip::C, Lane::In3A), Some(8));
    Ok(())
}

#[test]
fn failing_chip_does_not_stop_the_others() -> Result<()> {
    logging_init("adc16_calibrate");

    let board = EmulatedBoard::snap()
        .with_lane(Chip::A, Lane::In4B, LaneModel::new().never_syncs())
        .with_lanes(Chip::C, LaneModel::new().closed());
    let mut adc = adc16(board);
    let report = adc.calibrate_all_chips(&AdcConfig::default())?;

    assert!(!report.is_complete());
    assert_eq!(report.calibrated.len(), 1);
    assert!(report.chip(Chip::B).is_some());
    assert_eq!(
        report.failed,
        [
            (
                Chip::A,
                Error::BitslipSyncTimeout {
                    chip: Chip::A,
                    lane: Lane::In4B,
                    attempts: 10
                }
            ),
            (
                Chip::C,
                Error::CalibrationWindowEmpty {
                    chip: Chip::C,
                    lane: Lane::In1A
                }
            ),
        ]
    );
    assert_eq!(adc.bus().fpga_demux(), DemuxMode::Demux1);
    Ok(())
}

#[test]
fn calibrates_only_selected_chips() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    let config = AdcConfig {
        chips: ChipSelect::from_chips(&[Chip::A, Chip::C]),
        ..Default::default()
    };
    let report = adc.calibrate_all_chips(&config)?;

    assert!(report.is_complete());
    let chips: Vec<Chip> = report.calibrated.iter().map(|c| c.chip).collect();
    assert_eq!(chips, [Chip::A, Chip::C]);
    assert_eq!(adc.bus().tap(Chip::B, Lane::In1A), Some(0));
    assert_eq!(adc.bus().tap(Chip::C, Lane::In1A), Some(16));
    Ok(())
}

#[test]
fn check_calibration_after_calibrate() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(EmulatedBoard::snap());
    assert!(adc.check_calibration()?.iter().all(|(_, clean)| !clean));

    let report = adc.calibrate_all_chips(&AdcConfig::default())?;
    assert!(report.is_complete());
    let checked = adc.check_calibration()?;
    assert_eq!(checked, [(Chip::A, true), (Chip::B, true), (Chip::C, true)]);
    Ok(())
}

#[test]
fn cancelled_calibration_touches_nothing() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    let cancel = adc.cancel_token();
    cancel.cancel();

    assert_eq!(
        adc.calibrate(Chip::A, &AdcConfig::default()),
        Err(Error::Cancelled)
    );
    assert!(adc.bus().writes().is_empty());
    Ok(())
}

#[test]
fn expired_deadline_aborts_the_board() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    adc.set_cancel_token(CancelToken::with_timeout(Duration::ZERO));

    assert!(matches!(
        adc.calibrate_all_chips(&AdcConfig::default()),
        Err(Error::Cancelled)
    ));
    Ok(())
}

#[test]
fn transport_error_mid_sweep_stops_bus_traffic() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = Adc16::with_settings(FailingSnapshot::new(5), fast_settings())?;
    assert_eq!(
        adc.calibrate(Chip::A, &AdcConfig::default()),
        Err(Error::Transport("link dropped".to_string()))
    );
    assert_eq!(adc.bus().writes_after_failure(), Some(0));
    Ok(())
}

#[test]
fn cancel_mid_sweep_stops_bus_traffic() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = Adc16::with_settings(FailingSnapshot::new(5), fast_settings())?;
    let token = adc.cancel_token();
    adc.bus_mut().cancel = Some(token);
    assert_eq!(
        adc.calibrate(Chip::A, &AdcConfig::default()),
        Err(Error::Cancelled)
    );
    assert_eq!(adc.bus().writes_after_failure(), Some(0));
    Ok(())
}

#[test]
fn lost_board_aborts_the_run() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    adc.bus_mut().disconnect();

    assert!(matches!(
        adc.calibrate_all_chips(&AdcConfig::default()),
        Err(Error::Transport(_))
    ));
    Ok(())
}

#[test]
fn board_clock_estimate() -> Result<()> {
    logging_init("adc16_calibrate");

    let mut adc = adc16(EmulatedBoard::snap().with_clock(250.0, u32::MAX - 1000));
    let mhz = adc.estimate_board_clock(Duration::from_millis(50))?;
    assert!((mhz - 250.0).abs() < 12.5, "estimated {mhz} MHz");

    assert!(matches!(
        adc.estimate_board_clock(Duration::ZERO),
        Err(Error::InvalidArgument(_))
    ));
    Ok(())
}
