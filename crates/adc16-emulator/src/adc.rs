use adc16_globals::adc16::{DESKEW_EXPECTED, FRAME_LEN, NUM_TAPS, SNAPSHOT_LEN, SYNC_EXPECTED};
use adc16_globals::{Lane, REGISTER_MAP};
use adc16_wire::Transaction;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Behaviour of one SERDES lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneModel {
    /// Taps at which the deskew pattern is captured without errors.
    pub eye: Option<RangeInclusive<u8>>,
    /// Eye that replaces `eye` on the first bitslip.
    pub shifted_eye: Option<RangeInclusive<u8>>,
    /// Bitslips (mod 8) after which the sync pattern lines up. `None` never
    /// lines up.
    pub sync_slips: Option<u8>,
    pub(crate) tap: u8,
    pub(crate) slips: u32,
}

impl Default for LaneModel {
    fn default() -> Self {
        Self {
            eye: Some(8..=24),
            shifted_eye: None,
            sync_slips: Some(0),
            tap: 0,
            slips: 0,
        }
    }
}

impl LaneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eye(mut self, first: u8, last: u8) -> Self {
        self.eye = Some(first..=last);
        self
    }

    /// No tap captures the deskew pattern.
    pub fn closed(mut self) -> Self {
        self.eye = None;
        self
    }

    pub fn shifted_eye(mut self, first: u8, last: u8) -> Self {
        self.shifted_eye = Some(first..=last);
        self
    }

    pub fn sync_after(mut self, slips: u8) -> Self {
        self.sync_slips = Some(slips % FRAME_LEN as u8);
        self
    }

    pub fn never_syncs(mut self) -> Self {
        self.sync_slips = None;
        self
    }

    pub fn tap(&self) -> u8 {
        self.tap
    }

    pub fn slips(&self) -> u32 {
        self.slips
    }

    pub(crate) fn bitslip(&mut self) {
        self.slips += 1;
        if let Some(eye) = self.shifted_eye.take() {
            self.eye = Some(eye);
        }
    }

    /// Eighths of the deskew frames that read back wrong at the current tap.
    fn deskew_errors(&self) -> usize {
        match &self.eye {
            None => FRAME_LEN,
            Some(eye) if eye.contains(&self.tap) => 0,
            Some(eye) => {
                let distance = if self.tap < *eye.start() {
                    eye.start() - self.tap
                } else {
                    self.tap - eye.end()
                };
                (distance as usize).min(FRAME_LEN)
            }
        }
    }

    fn sync_value(&self) -> u8 {
        match self.sync_slips {
            Some(required) => {
                let pending = (required as u32 + FRAME_LEN as u32 - self.slips % FRAME_LEN as u32)
                    % FRAME_LEN as u32;
                (SYNC_EXPECTED as u8).rotate_left(pending)
            }
            None => 0x00,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Samples,
    Ramp,
    Deskew,
    Sync,
}

/// One emulated HMCAD1511 with its eight SERDES lanes.
#[derive(Debug, Clone)]
pub struct EmulatedAdc {
    registers: BTreeMap<u8, u16>,
    pub(crate) lanes: [LaneModel; 8],
    capture: Vec<u8>,
}

impl Default for EmulatedAdc {
    fn default() -> Self {
        Self {
            registers: BTreeMap::new(),
            lanes: Default::default(),
            capture: vec![0; SNAPSHOT_LEN],
        }
    }
}

impl EmulatedAdc {
    pub fn register(&self, address: u8) -> u16 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    pub fn lane(&self, lane: Lane) -> &LaneModel {
        &self.lanes[lane.offset()]
    }

    pub(crate) fn apply(&mut self, transaction: &Transaction) {
        if transaction.address == 0x00 && transaction.data & 1 == 1 {
            log::trace!("software reset");
            self.registers.clear();
            return;
        }
        self.registers.insert(transaction.address, transaction.data);
    }

    fn field(&self, name: &str) -> u16 {
        REGISTER_MAP
            .lookup(name)
            .map(|field| field.decode(self.register(field.address)))
            .unwrap_or(0)
    }

    fn output(&self) -> Output {
        if self.field("pat_deskew") == 1 {
            Output::Deskew
        } else if self.field("pat_sync") == 1 {
            Output::Sync
        } else if self.field("en_ramp") == 1 {
            Output::Ramp
        } else {
            Output::Samples
        }
    }

    pub(crate) fn snap(&mut self) {
        let output = self.output();
        for (i, sample) in self.capture.iter_mut().enumerate() {
            let frame = i / FRAME_LEN;
            let lane = &self.lanes[i % FRAME_LEN];
            *sample = match output {
                Output::Deskew => {
                    if frame % FRAME_LEN < lane.deskew_errors() {
                        DESKEW_EXPECTED as u8 ^ 0x04
                    } else {
                        DESKEW_EXPECTED as u8
                    }
                }
                Output::Sync => lane.sync_value(),
                Output::Ramp => i as u8,
                Output::Samples => (((i * 7) % 61) as u8).wrapping_add(226),
            };
        }
    }

    pub(crate) fn capture(&self) -> &[u8] {
        &self.capture
    }

    pub(crate) fn set_tap(&mut self, lane: Lane, tap: u8) {
        self.lanes[lane.offset()].tap = tap % NUM_TAPS;
    }
}
