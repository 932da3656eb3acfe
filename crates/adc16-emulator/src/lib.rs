//! A software model of a SNAP style board running an ADC16 design.
//!
//! The board decodes the 3-wire register writes into per chip HMCAD1511
//! register files, reacts to bitslip, delay strobe, demux and snapshot
//! requests on the control words, and serves snapshots whose content follows
//! the selected test pattern and the per lane [`LaneModel`].

pub mod adc;

pub use adc::{EmulatedAdc, LaneModel};

use adc16_globals::adc16::{
    CONTROLLER, LOCK_SHIFT, REVISION_SHIFT, SNAPSHOT_RAM_PREFIX, SUPPORTED_CHIPS_SHIFT,
    SYS_CLKCOUNTER, WORD_3WIRE, WORD_CONTROL, WORD_DELAY_STROBE_A, WORD_DELAY_STROBE_B,
};
use adc16_globals::{Chip, DemuxMode, Error, Lane, LaneSide, RegisterBus, Result};
use adc16_wire::{ControlWord, DelayStrobe, ThreeWireDecoder, Transaction};
use std::collections::BTreeSet;
use std::time::Instant;

/// One write as issued on the register bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusWrite {
    pub register: String,
    pub value: u32,
    pub word_offset: u32,
}

pub struct EmulatedBoard {
    adcs: Vec<EmulatedAdc>,
    words: [u32; 4],
    decoder: ThreeWireDecoder,
    transactions: Vec<Transaction>,
    writes: Vec<BusWrite>,
    fpga_demux: DemuxMode,
    lock_bits: u8,
    revision: u8,
    adc16_design: bool,
    connected: bool,
    clock_mhz: f64,
    counter_start: u32,
    started: Instant,
}

impl EmulatedBoard {
    /// A board with `chips` ADCs (at most 8), all lanes on their defaults.
    pub fn new(chips: usize) -> Self {
        Self {
            adcs: vec![EmulatedAdc::default(); chips.min(Chip::ALL.len())],
            words: [0; 4],
            decoder: ThreeWireDecoder::new(),
            transactions: Vec::new(),
            writes: Vec::new(),
            fpga_demux: DemuxMode::Demux1,
            lock_bits: 0b11,
            revision: 2,
            adc16_design: true,
            connected: true,
            clock_mhz: 250.0,
            counter_start: 0,
            started: Instant::now(),
        }
    }

    /// Three chips, as on a SNAP board.
    pub fn snap() -> Self {
        Self::new(Chip::SNAP.len())
    }

    pub fn with_lane(mut self, chip: Chip, lane: Lane, model: LaneModel) -> Self {
        if let Some(adc) = self.adcs.get_mut(chip.index() as usize) {
            adc.lanes[lane.offset()] = model;
        }
        self
    }

    pub fn with_lanes(mut self, chip: Chip, model: LaneModel) -> Self {
        if let Some(adc) = self.adcs.get_mut(chip.index() as usize) {
            adc.lanes = std::array::from_fn(|_| model.clone());
        }
        self
    }

    pub fn with_lock_bits(mut self, lock_bits: u8) -> Self {
        self.lock_bits = lock_bits;
        self
    }

    /// Load a design without an ADC16 controller.
    pub fn without_adc16(mut self) -> Self {
        self.adc16_design = false;
        self
    }

    /// `sys_clkcounter` counts at `mhz`, starting from `start`.
    pub fn with_clock(mut self, mhz: f64, start: u32) -> Self {
        self.clock_mhz = mhz;
        self.counter_start = start;
        self
    }

    pub fn set_lock_bits(&mut self, lock_bits: u8) {
        self.lock_bits = lock_bits;
    }

    /// Every later bus access fails.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn adc(&self, chip: Chip) -> Option<&EmulatedAdc> {
        self.adcs.get(chip.index() as usize)
    }

    /// Last value written to an HMCAD1511 register of `chip`.
    pub fn adc_register(&self, chip: Chip, address: u8) -> u16 {
        self.adc(chip).map(|adc| adc.register(address)).unwrap_or(0)
    }

    pub fn tap(&self, chip: Chip, lane: Lane) -> Option<u8> {
        self.adc(chip).map(|adc| adc.lane(lane).tap())
    }

    pub fn slips(&self, chip: Chip, lane: Lane) -> Option<u32> {
        self.adc(chip).map(|adc| adc.lane(lane).slips())
    }

    pub fn fpga_demux(&self) -> DemuxMode {
        self.fpga_demux
    }

    pub fn writes(&self) -> &[BusWrite] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Register writes decoded from the 3-wire bus.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn status_word(&self) -> u32 {
        ((self.lock_bits as u32 & 0b11) << LOCK_SHIFT)
            | ((self.adcs.len() as u32 & 0xf) << SUPPORTED_CHIPS_SHIFT)
            | ((self.revision as u32 & 0b11) << REVISION_SHIFT)
            | (self.words[0] & 0x3ff)
    }

    fn clock_counter(&self) -> u32 {
        let ticks = self.started.elapsed().as_secs_f64() * self.clock_mhz * 1e6;
        self.counter_start.wrapping_add(ticks as u64 as u32)
    }

    fn write_3wire(&mut self, value: u32) {
        if let Some(transaction) = self.decoder.push(value) {
            log::trace!("3-wire {transaction}");
            for chip in transaction.chip_select.chips() {
                if let Some(adc) = self.adcs.get_mut(chip.index() as usize) {
                    adc.apply(&transaction);
                }
            }
            self.transactions.push(transaction);
        }
    }

    fn write_control(&mut self, value: u32) {
        let previous = ControlWord::from(self.words[WORD_CONTROL as usize]);
        let word = ControlWord::from(value);

        let slipped = word.bitslip_chips & !previous.bitslip_chips;
        if slipped != 0 {
            if let Ok(lane) = Lane::try_from(word.bitslip_lane) {
                for (i, adc) in self.adcs.iter_mut().enumerate() {
                    if slipped & (1 << i) != 0 {
                        log::trace!("bitslip chip {i} lane {lane}");
                        adc.lanes[lane.offset()].bitslip();
                    }
                }
            }
        }
        if word.snap_request && !previous.snap_request {
            self.adcs.iter_mut().for_each(EmulatedAdc::snap);
        }
        if let Some(mode) = word.demux {
            self.fpga_demux = mode;
        }
    }

    fn write_strobe(&mut self, side: LaneSide, previous: u32, value: u32) {
        let tap = ControlWord::from(self.words[WORD_CONTROL as usize]).tap;
        for (chip, lane) in DelayStrobe::strobed_lanes(side, value & !previous) {
            if let Some(adc) = self.adcs.get_mut(chip.index() as usize) {
                adc.set_tap(lane, tap);
            }
        }
    }

    fn check_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::Transport("board not reachable".to_string()))
        }
    }
}

impl RegisterBus for EmulatedBoard {
    fn write_register(&mut self, name: &str, value: u32, word_offset: u32) -> Result<()> {
        self.check_connected()?;
        self.writes.push(BusWrite {
            register: name.to_string(),
            value,
            word_offset,
        });
        if name != CONTROLLER || !self.adc16_design {
            return Err(Error::Transport(format!("no writable register {name}")));
        }

        let previous = match self.words.get(word_offset as usize) {
            Some(word) => *word,
            None => {
                return Err(Error::Transport(format!(
                    "word offset {word_offset} outside {name}"
                )));
            }
        };
        match word_offset {
            WORD_3WIRE => self.write_3wire(value),
            WORD_CONTROL => self.write_control(value),
            WORD_DELAY_STROBE_A => self.write_strobe(LaneSide::A, previous, value),
            WORD_DELAY_STROBE_B => self.write_strobe(LaneSide::B, previous, value),
            _ => {}
        }
        self.words[word_offset as usize] = value;
        Ok(())
    }

    fn read_memory(&mut self, region: &str, byte_count: usize, offset: usize) -> Result<Vec<u8>> {
        self.check_connected()?;
        let bytes: Vec<u8> = if region == CONTROLLER && self.adc16_design {
            let mut words = self.words;
            words[0] = self.status_word();
            words.iter().flat_map(|w| w.to_be_bytes()).collect()
        } else if region == SYS_CLKCOUNTER {
            self.clock_counter().to_be_bytes().to_vec()
        } else if let Some(adc) = region
            .strip_prefix(SNAPSHOT_RAM_PREFIX)
            .filter(|_| self.adc16_design)
            .and_then(|index| index.parse::<usize>().ok())
            .and_then(|index| self.adcs.get(index))
        {
            adc.capture().to_vec()
        } else {
            return Err(Error::Transport(format!("no readable region {region}")));
        };

        let available = bytes.len().saturating_sub(offset);
        if available < byte_count {
            return Err(Error::TransferTruncated {
                actual: available,
                expected: byte_count,
            });
        }
        Ok(bytes[offset..offset + byte_count].to_vec())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn list_registers(&mut self) -> Result<BTreeSet<String>> {
        self.check_connected()?;
        let mut names: BTreeSet<String> = ["sys_board_id", SYS_CLKCOUNTER]
            .into_iter()
            .map(String::from)
            .collect();
        if self.adc16_design {
            names.insert(CONTROLLER.to_string());
            names.extend((0..self.adcs.len()).map(|i| format!("{SNAPSHOT_RAM_PREFIX}{i}")));
        }
        Ok(names)
    }
}
