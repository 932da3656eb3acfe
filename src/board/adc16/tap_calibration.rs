use crate::board::adc16::Adc16;
use crate::{Error, Result};
use adc16_globals::adc16::{DESKEW_EXPECTED, WORD_CONTROL, WORD_DELAY_STROBE_A, WORD_DELAY_STROBE_B};
use adc16_globals::{Chip, DemuxMode, Lane, LaneSide, RegisterBus, Tap, TestPattern};
use adc16_wire::DelayStrobe;
use adc16_wire::control::delay_tap;
use std::fmt::{Display, Formatter};

/// Deskew error counts of the 8 lanes for every tap of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorMatrix {
    rows: Vec<[u32; 8]>,
}

impl ErrorMatrix {
    /// `rows[tap]` holds the error count of every lane at that tap.
    pub fn from_rows(rows: Vec<[u32; 8]>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[u32; 8]] {
        &self.rows
    }

    pub fn errors(&self, tap: Tap, lane: Lane) -> Option<u32> {
        self.rows
            .get(tap.value() as usize)
            .map(|row| row[lane.offset()])
    }

    /// Taps at which `lane` captured the deskew pattern without error.
    pub fn good_taps(&self, lane: Lane) -> GoodTapWindow {
        let taps = Tap::all()
            .zip(&self.rows)
            .filter(|(_, row)| row[lane.offset()] == 0)
            .map(|(tap, _)| tap)
            .collect();
        GoodTapWindow { taps }
    }

    /// Center of the error free window of each lane.
    pub fn best_taps(&self, chip: Chip) -> Result<[Tap; 8]> {
        let mut best = [Tap::MIN; 8];
        for lane in Lane::ALL {
            let window = self.good_taps(lane);
            log::debug!("chip {chip} lane {lane}: good taps {window}");
            best[lane.offset()] = window.best_tap().ok_or_else(|| {
                log::error!("chip {chip} lane {lane}: no error free tap");
                Error::CalibrationWindowEmpty { chip, lane }
            })?;
        }
        Ok(best)
    }
}

impl Display for ErrorMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "tap   1a   1b   2a   2b   3a   3b   4a   4b")?;
        for (tap, row) in self.rows.iter().enumerate() {
            write!(f, "{tap:3}")?;
            for errors in row {
                write!(f, " {errors:4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The error free taps of one lane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoodTapWindow {
    taps: Vec<Tap>,
}

impl GoodTapWindow {
    pub fn new(mut taps: Vec<Tap>) -> Self {
        taps.sort();
        taps.dedup();
        Self { taps }
    }

    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// `(min + max) / 2`, rounded down. `None` for an empty window.
    pub fn best_tap(&self) -> Option<Tap> {
        let first = self.taps.first()?.value();
        let last = self.taps.last()?.value();
        Tap::new((first + last) / 2).ok()
    }
}

impl Display for GoodTapWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let taps: Vec<String> = self.taps.iter().map(Tap::to_string).collect();
        write!(f, "[{}]", taps.join(", "))
    }
}

impl<B: RegisterBus> Adc16<B> {
    /// Load `tap` into all 8 lanes of `chip`.
    pub fn delay_tap_all(&mut self, chip: Chip, tap: Tap) -> Result<()> {
        let a = DelayStrobe::broadcast(chip, LaneSide::A);
        let b = DelayStrobe::broadcast(chip, LaneSide::B);

        self.write_control(WORD_DELAY_STROBE_A, 0)?;
        self.write_control(WORD_DELAY_STROBE_B, 0)?;
        self.write_control(WORD_CONTROL, delay_tap(tap))?;
        self.write_control(a.word_offset(), a.value)?;
        self.write_control(b.word_offset(), b.value)?;
        self.clear_delay_words()
    }

    /// Load `tap` into a single lane of `chip`.
    pub fn delay_tap(&mut self, chip: Chip, lane: Lane, tap: Tap) -> Result<()> {
        log::debug!("chip {chip} lane {lane}: tap {tap}");
        let strobe = DelayStrobe::lane(chip, lane);

        self.write_control(strobe.word_offset(), 0)?;
        self.write_control(WORD_CONTROL, delay_tap(tap))?;
        self.write_control(strobe.word_offset(), strobe.value)?;
        self.clear_delay_words()
    }

    fn clear_delay_words(&mut self) -> Result<()> {
        for word in [WORD_CONTROL, WORD_DELAY_STROBE_A, WORD_DELAY_STROBE_B] {
            self.write_control(word, 0)?;
        }
        Ok(())
    }

    /// Deskew error count of every lane of `chip` with all lanes at `tap`.
    ///
    /// Expects the deskew pattern to be enabled.
    pub fn test_tap(&mut self, chip: Chip, tap: Tap) -> Result<[u32; 8]> {
        self.delay_tap_all(chip, tap)?;
        let errors = self.read_snapshot(chip)?.mismatches(DESKEW_EXPECTED);
        log::trace!("chip {chip} tap {tap}: errors {errors:?}");
        Ok(errors)
    }

    /// Error counts for every tap.
    pub fn sweep_taps(&mut self, chip: Chip) -> Result<ErrorMatrix> {
        let mut rows = Vec::with_capacity(Tap::all().count());
        for tap in Tap::all() {
            self.cancel.check()?;
            rows.push(self.test_tap(chip, tap)?);
        }
        Ok(ErrorMatrix::from_rows(rows))
    }

    /// Bitslip lanes that are error free at tap 0 or 31, so the sweep covers
    /// the whole eye instead of a part wrapping around the tap range.
    ///
    /// Returns whether any lane was slipped.
    fn center_eyes(&mut self, chip: Chip, matrix: &ErrorMatrix) -> Result<bool> {
        let mut first = matrix.rows().first().copied().unwrap_or_default();
        let mut last = matrix.rows().last().copied().unwrap_or_default();
        let mut slipped = false;

        for lane in Lane::ALL {
            let i = lane.offset();
            if first[i] != 0 && last[i] != 0 {
                continue;
            }
            for _ in 0..self.settings.edge_check_retries {
                self.cancel.check()?;
                log::debug!("chip {chip} lane {lane}: eye touches the tap range, bitslipping");
                self.bitslip(chip, lane)?;
                slipped = true;
                first = self.test_tap(chip, Tap::MIN)?;
                last = self.test_tap(chip, Tap::MAX)?;
                if first[i] != 0 && last[i] != 0 {
                    break;
                }
            }
            if first[i] == 0 || last[i] == 0 {
                log::warn!("chip {chip} lane {lane}: eye still touches the tap range");
            }
        }
        Ok(slipped)
    }

    /// Find and program the best delay tap of every lane of `chip`.
    ///
    /// Leaves the FPGA in demux 4 and the deskew pattern enabled.
    pub fn walk_taps(&mut self, chip: Chip) -> Result<[Tap; 8]> {
        log::info!("calibrating delay taps of chip {chip}");
        self.fpga_set_demux(DemuxMode::Demux4)?;
        self.enable_pattern(TestPattern::Deskew)?;

        let mut matrix = self.sweep_taps(chip)?;
        if self.center_eyes(chip, &matrix)? {
            matrix = self.sweep_taps(chip)?;
        }
        log::debug!("chip {chip} deskew errors\n{matrix}");

        let best = matrix.best_taps(chip)?;
        for lane in Lane::ALL {
            self.delay_tap(chip, lane, best[lane.offset()])?;
        }
        log::info!("chip {chip}: taps {best:?}");
        Ok(best)
    }
}
