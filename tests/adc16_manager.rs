mod common;

use crate::common::*;

use adc16_emulator::{EmulatedBoard, LaneModel};
use libadc16_rs::manager::calibrate_boards;
use libadc16_rs::{AdcConfig, Chip, DemuxMode, Error, Lane};

#[tokio::test]
async fn boards_are_calibrated_independently() {
    logging_init("libadc16_rs");

    let boards = vec![
        adc16(EmulatedBoard::snap()),
        adc16(EmulatedBoard::snap().with_lane(Chip::B, Lane::In2A, LaneModel::new().closed())),
        adc16(EmulatedBoard::snap().with_lock_bits(0)),
    ];
    let config = AdcConfig {
        demux: DemuxMode::Demux2,
        ..Default::default()
    };
    let reports = calibrate_boards(boards, config).await;
    assert_eq!(reports.len(), 3);

    let first = reports[0].result.as_ref().unwrap();
    assert!(first.is_complete());
    assert_eq!(first.calibrated.len(), 3);
    assert_eq!(reports[0].board.bus().fpga_demux(), DemuxMode::Demux2);
    assert_eq!(reports[0].board.bus().tap(Chip::C, Lane::In4B), Some(16));

    let second = reports[1].result.as_ref().unwrap();
    assert_eq!(second.calibrated.len(), 2);
    assert_eq!(
        second.failed,
        [(
            Chip::B,
            Error::CalibrationWindowEmpty {
                chip: Chip::B,
                lane: Lane::In2A
            }
        )]
    );

    assert!(matches!(
        reports[2].result,
        Err(Error::ClockNotLocked { lock_bits: 0 })
    ));
}

#[tokio::test]
async fn no_boards() {
    let reports = calibrate_boards::<EmulatedBoard>(Vec::new(), AdcConfig::default()).await;
    assert!(reports.is_empty());
}
