use crate::board::adc16::Adc16;
use crate::{Error, Result};
use adc16_globals::adc16::{SYNC_EXPECTED, WORD_CONTROL};
use adc16_globals::{Chip, Lane, RegisterBus, TestPattern};

impl<B: RegisterBus> Adc16<B> {
    /// Shift the ISERDES of one lane by one bit.
    pub fn bitslip(&mut self, chip: Chip, lane: Lane) -> Result<()> {
        log::trace!("bitslip chip {chip} lane {lane}");
        self.write_control(WORD_CONTROL, 0)?;
        self.write_control(WORD_CONTROL, adc16_wire::control::bitslip(chip, lane))?;
        self.write_control(WORD_CONTROL, 0)
    }

    /// Bitslip every lane of `chip` until the sync pattern shows up at its
    /// place in the frame.
    ///
    /// Returns the number of bitslips applied per lane.
    pub fn sync_chip(&mut self, chip: Chip) -> Result<[u32; 8]> {
        log::info!("synchronizing lanes of chip {chip}");
        self.enable_pattern(TestPattern::Sync)?;
        let max_attempts = self.settings.bitslip_retries;

        let mut slips = [0u32; 8];
        let mut snapshot = self.read_snapshot(chip)?;
        for lane in Lane::ALL {
            while snapshot[lane.offset()] != SYNC_EXPECTED {
                if slips[lane.offset()] >= max_attempts {
                    log::error!(
                        "chip {chip} lane {lane}: no sync after {max_attempts} bitslips, \
                         is the design built with current ADC16 libraries?"
                    );
                    return Err(Error::BitslipSyncTimeout {
                        chip,
                        lane,
                        attempts: max_attempts,
                    });
                }
                self.cancel.check()?;
                self.bitslip(chip, lane)?;
                slips[lane.offset()] += 1;
                snapshot = self.read_snapshot(chip)?;
            }
        }
        log::debug!("chip {chip}: bitslips {slips:?}");
        Ok(slips)
    }
}
