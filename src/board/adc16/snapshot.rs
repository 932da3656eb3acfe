use crate::board::adc16::Adc16;
use crate::{Error, Result};
use adc16_globals::adc16::{FRAME_LEN, SNAPSHOT_LEN, WORD_CONTROL};
use adc16_globals::{Chip, DemuxMode, Lane, RegisterBus};
use std::ops::Index;

/// 1024 signed samples captured from one chip.
///
/// Every 8 byte frame holds one sample per [`Lane`], in lane order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    samples: Vec<i8>,
}

impl Snapshot {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SNAPSHOT_LEN {
            return Err(Error::TransferTruncated {
                actual: bytes.len(),
                expected: SNAPSHOT_LEN,
            });
        }
        Ok(Self {
            samples: bytes.iter().map(|b| *b as i8).collect(),
        })
    }

    pub fn samples(&self) -> &[i8] {
        &self.samples
    }

    pub fn frames(&self) -> impl Iterator<Item = &[i8]> {
        self.samples.chunks_exact(FRAME_LEN)
    }

    /// The 128 samples of one lane.
    pub fn lane(&self, lane: Lane) -> impl Iterator<Item = i8> + '_ {
        self.frames().map(move |frame| frame[lane.offset()])
    }

    /// Per lane count of samples different from `expected`.
    pub fn mismatches(&self, expected: i8) -> [u32; 8] {
        let mut errors = [0u32; 8];
        for frame in self.frames() {
            for (count, sample) in errors.iter_mut().zip(frame) {
                if *sample != expected {
                    *count += 1;
                }
            }
        }
        errors
    }

    pub fn all_equal(&self, expected: i8) -> bool {
        self.samples.iter().all(|s| *s == expected)
    }

    /// Standard deviation of all samples.
    pub fn rms(&self) -> f64 {
        let n = self.samples.len() as f64;
        let mean = self.samples.iter().map(|s| *s as f64).sum::<f64>() / n;
        let variance = self
            .samples
            .iter()
            .map(|s| (*s as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    }

    /// Split the byte stream into the time ordered samples of each active
    /// input for the FPGA demux `mode`.
    ///
    /// Demux 1 yields inputs 1 to 4, demux 2 inputs 1 and 3, demux 4 input 1.
    pub fn demux(&self, mode: DemuxMode) -> Vec<Vec<i8>> {
        let orders: &[&[usize]] = match mode {
            DemuxMode::Demux1 => &[&[0, 4], &[1, 5], &[2, 6], &[3, 7]],
            DemuxMode::Demux2 => &[&[0, 4, 1, 5], &[2, 6, 3, 7]],
            DemuxMode::Demux4 => &[&[0, 2, 4, 6, 1, 3, 5, 7]],
        };
        orders
            .iter()
            .map(|order| {
                self.frames()
                    .flat_map(|frame| order.iter().map(move |i| frame[*i]))
                    .collect()
            })
            .collect()
    }
}

impl Index<usize> for Snapshot {
    type Output = i8;

    fn index(&self, index: usize) -> &i8 {
        &self.samples[index]
    }
}

impl<B: RegisterBus> Adc16<B> {
    /// Trigger a capture on all chips and read the one of `chip`.
    pub fn read_snapshot(&mut self, chip: Chip) -> Result<Snapshot> {
        self.write_control(WORD_CONTROL, 0)?;
        self.write_control(WORD_CONTROL, adc16_wire::control::snap_request())?;
        let bytes = self
            .bus_mut()
            .read_memory(&chip.snapshot_region(), SNAPSHOT_LEN, 0)?;
        Snapshot::from_bytes(&bytes)
    }

    /// Standard deviation of a fresh snapshot of every selected chip.
    pub fn check_rms(&mut self) -> Result<Vec<(Chip, f64)>> {
        let chips: Vec<Chip> = self.adc().chip_select().chips().collect();
        chips
            .into_iter()
            .map(|chip| {
                let rms = self.read_snapshot(chip)?.rms();
                log::info!("ADC {chip}: rms {rms:.2}");
                Ok((chip, rms))
            })
            .collect()
    }
}
