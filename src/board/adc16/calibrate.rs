use crate::board::adc16::{Adc16, AdcConfig};
use crate::{Error, Result};
use adc16_globals::adc16::DESKEW_EXPECTED;
use adc16_globals::{Chip, RegisterBus, Tap, TestPattern};

/// Result of a successful calibration of one chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipCalibration {
    pub chip: Chip,
    /// Programmed delay tap, indexed by lane offset.
    pub taps: [Tap; 8],
    /// Bitslips needed to line up the sync pattern, indexed by lane offset.
    pub slips: [u32; 8],
}

/// Outcome of calibrating every chip of a board.
#[derive(Debug, Clone, Default)]
pub struct BoardCalibration {
    pub calibrated: Vec<ChipCalibration>,
    /// Chips whose calibration failed, with the reason.
    pub failed: Vec<(Chip, Error)>,
}

impl BoardCalibration {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn chip(&self, chip: Chip) -> Option<&ChipCalibration> {
        self.calibrated.iter().find(|c| c.chip == chip)
    }
}

impl<B: RegisterBus> Adc16<B> {
    fn require_clock_lock(&mut self) -> Result<()> {
        let lock_bits = self.lock_bits()?;
        if lock_bits == 0 {
            log::error!("could not calibrate, ADC clock not locked");
            return Err(Error::ClockNotLocked { lock_bits });
        }
        log::info!("ADC clock is locked");
        Ok(())
    }

    fn calibrate_chip(&mut self, chip: Chip) -> Result<ChipCalibration> {
        let taps = self.walk_taps(chip)?;
        let slips = self.sync_chip(chip)?;
        Ok(ChipCalibration { chip, taps, slips })
    }

    /// Back to sampled data in the operating demux mode.
    fn restore(&mut self, config: &AdcConfig) -> Result<()> {
        self.clear_pattern()?;
        self.set_demux(config.demux)
    }

    fn calibrate_and_restore(&mut self, chip: Chip, config: &AdcConfig) -> Result<ChipCalibration> {
        self.cancel.check()?;
        let calibration = match self.calibrate_chip(chip) {
            Ok(calibration) => calibration,
            Err(e) if e.is_chip_failure() => {
                if let Err(restore) = self.restore(config) {
                    log::error!(
                        "chip {chip}: restoring demux {} failed: {restore}",
                        config.demux.factor()
                    );
                }
                return Err(e);
            }
            // no further bus traffic after a transport error or cancellation
            Err(e) => return Err(e),
        };
        self.restore(config)?;
        log::info!("chip {chip} calibrated");
        Ok(calibration)
    }

    /// Deskew and frame align the lanes of `chip`.
    ///
    /// Refuses to start without a locked ADC clock or when `chip` is not part
    /// of `config.chips`. The operating demux mode of `config` is restored
    /// afterwards, also when the chip fails calibration. Bus errors and
    /// cancellation return without touching the bus again.
    pub fn calibrate(&mut self, chip: Chip, config: &AdcConfig) -> Result<ChipCalibration> {
        if !config.chips.contains(chip) {
            log::error!("chip {chip} is not selected by the configuration");
            return Err(Error::InvalidArgument(format!(
                "chip {chip} not in chip select {:#010b}",
                config.chips.bits()
            )));
        }
        self.set_chip_select(config.chips);
        self.require_clock_lock()?;
        self.calibrate_and_restore(chip, config)
    }

    /// Calibrate every chip of `config`.
    ///
    /// A chip that cannot be calibrated is recorded in the report and the
    /// remaining chips are still calibrated. Bus errors and cancellation end
    /// the run.
    pub fn calibrate_all_chips(&mut self, config: &AdcConfig) -> Result<BoardCalibration> {
        self.set_chip_select(config.chips);
        self.require_clock_lock()?;

        let mut report = BoardCalibration::default();
        for chip in config.chips.chips() {
            match self.calibrate_and_restore(chip, config) {
                Ok(calibration) => report.calibrated.push(calibration),
                Err(e) if e.is_chip_failure() => {
                    log::warn!("chip {chip} failed calibration: {e}");
                    report.failed.push((chip, e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Whether every selected chip outputs a clean deskew pattern.
    pub fn check_calibration(&mut self) -> Result<Vec<(Chip, bool)>> {
        let chips: Vec<Chip> = self.adc().chip_select().chips().collect();
        let mut results = Vec::with_capacity(chips.len());
        for chip in chips {
            self.enable_pattern(TestPattern::Deskew)?;
            let snapshot = self.read_snapshot(chip)?;
            self.clear_pattern()?;
            let clean = snapshot.all_equal(DESKEW_EXPECTED);
            log::info!("ADC {chip}: deskew clean {clean}");
            results.push((chip, clean));
        }
        Ok(results)
    }
}
