mod common;

use crate::common::*;

use adc16_emulator::{EmulatedBoard, LaneModel};
use libadc16_rs::adc16::{DESKEW_EXPECTED, SYNC_EXPECTED};
use libadc16_rs::{Chip, Lane, Result, Tap, TestPattern};

#[test]
fn deskew_pattern_reads_back() -> Result<()> {
    logging_init("adc16_pattern");

    let mut adc = adc16(EmulatedBoard::snap());
    adc.enable_pattern(TestPattern::Deskew)?;

    // taps are still at 0, outside the default eye
    let snapshot = adc.read_snapshot(Chip::A)?;
    assert!(!snapshot.all_equal(DESKEW_EXPECTED));

    adc.delay_tap_all(Chip::A, Tap::new(16)?)?;
    let snapshot = adc.read_snapshot(Chip::A)?;
    assert!(snapshot.all_equal(DESKEW_EXPECTED));
    assert_eq!(snapshot.mismatches(DESKEW_EXPECTED), [0; 8]);
    Ok(())
}

#[test]
fn cleared_pattern_does_not_leak() -> Result<()> {
    logging_init("adc16_pattern");

    let mut adc = adc16(EmulatedBoard::snap());
    adc.delay_tap_all(Chip::B, Tap::new(16)?)?;
    adc.enable_pattern(TestPattern::Deskew)?;
    assert!(adc.read_snapshot(Chip::B)?.all_equal(DESKEW_EXPECTED));

    adc.clear_pattern()?;
    let snapshot = adc.read_snapshot(Chip::B)?;
    assert!(!snapshot.all_equal(DESKEW_EXPECTED));
    assert_eq!(adc.bus().adc_register(Chip::B, 0x25), 0);
    assert_eq!(adc.bus().adc_register(Chip::B, 0x45), 0);
    Ok(())
}

#[test]
fn ramp_pattern() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    adc.enable_pattern(TestPattern::Ramp)?;

    let snapshot = adc.read_snapshot(Chip::C)?;
    assert_eq!(snapshot[0], 0);
    assert_eq!(snapshot[5], 5);
    assert_eq!(snapshot[200], 200u8 as i8);
    Ok(())
}

#[test]
fn patterns_replace_each_other() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    adc.enable_pattern(TestPattern::Ramp)?;
    adc.enable_pattern(TestPattern::Sync)?;

    assert_eq!(adc.bus().adc_register(Chip::A, 0x25), 0);
    assert_eq!(adc.bus().adc_register(Chip::A, 0x45), 0b10);
    assert!(adc.read_snapshot(Chip::A)?.all_equal(SYNC_EXPECTED));
    Ok(())
}

#[test]
fn sync_pattern_shows_misaligned_lane() -> Result<()> {
    let mut adc = adc16(
        EmulatedBoard::snap().with_lane(Chip::A, Lane::In3A, LaneModel::new().sync_after(2)),
    );
    adc.enable_pattern(TestPattern::Sync)?;

    let snapshot = adc.read_snapshot(Chip::A)?;
    let mismatches = snapshot.mismatches(SYNC_EXPECTED);
    assert_eq!(mismatches[Lane::In3A.offset()], 128);
    assert_eq!(mismatches.iter().sum::<u32>(), 128);
    Ok(())
}

#[test]
fn rms_of_pattern_and_data() -> Result<()> {
    let mut adc = adc16(EmulatedBoard::snap());
    let rms = adc.check_rms()?;
    assert_eq!(rms.len(), 3);
    assert!(rms.iter().all(|(_, rms)| *rms > 10.0));

    adc.delay_tap_all(Chip::A, Tap::new(16)?)?;
    adc.enable_pattern(TestPattern::Deskew)?;
    assert!(adc.read_snapshot(Chip::A)?.rms() < 1e-9);
    Ok(())
}
