use adc16_globals::ChipSelect;
use adc16_globals::adc16::{CHIP_SELECT_MASK, SCLK, SDATA_SHIFT, TRANSACTION_LEN};
use std::fmt::{Display, Formatter};

/// One value of control word 0 as seen by the 3-wire interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreeWireWord {
    pub chip_select: ChipSelect,
    pub sdata: bool,
    pub sclk: bool,
}

impl ThreeWireWord {
    pub const IDLE: ThreeWireWord = ThreeWireWord {
        chip_select: ChipSelect::from_bits(0),
        sdata: false,
        sclk: true,
    };
}

impl From<u32> for ThreeWireWord {
    /// Status bits (lock, revision, supported chips) are ignored.
    fn from(word: u32) -> Self {
        Self {
            chip_select: ChipSelect::from_bits((word & CHIP_SELECT_MASK) as u8),
            sdata: (word >> SDATA_SHIFT) & 1 == 1,
            sclk: word & SCLK != 0,
        }
    }
}

impl From<ThreeWireWord> for u32 {
    fn from(word: ThreeWireWord) -> Self {
        let mut value = word.chip_select.bits() as u32;
        if word.sdata {
            value |= 1 << SDATA_SHIFT;
        }
        if word.sclk {
            value |= SCLK;
        }
        value
    }
}

/// A single HMCAD1511 register write: 8 address bits then 16 data bits, sent
/// to every chip in `chip_select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub chip_select: ChipSelect,
    pub address: u8,
    pub data: u16,
}

impl Transaction {
    pub fn new(chip_select: ChipSelect, address: u8, data: u16) -> Self {
        Self {
            chip_select,
            address,
            data,
        }
    }

    /// The sequence of word 0 values that clocks this transaction out.
    ///
    /// Idle, then every bit MSB first as a clock low / clock high pair, then
    /// idle again. Always [`TRANSACTION_LEN`] words.
    pub fn encode(&self) -> Vec<u32> {
        let address_bits = (0..8).rev().map(|i| (self.address >> i) & 1 == 1);
        let data_bits = (0..16).rev().map(|i| (self.data >> i) & 1 == 1);

        let mut words = Vec::with_capacity(TRANSACTION_LEN);
        words.push(ThreeWireWord::IDLE.into());
        for sdata in address_bits.chain(data_bits) {
            let low = ThreeWireWord {
                chip_select: self.chip_select,
                sdata,
                sclk: false,
            };
            words.push(low.into());
            words.push(ThreeWireWord { sclk: true, ..low }.into());
        }
        words.push(ThreeWireWord::IDLE.into());
        words
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cs={:#010b} addr={:#04x} data={:#06x}",
            self.chip_select.bits(),
            self.address,
            self.data
        )
    }
}

/// Rebuilds [`Transaction`]s from a stream of word 0 writes.
///
/// SDATA is sampled on every rising SCLK edge while a chip is selected. A
/// transaction completes when the chip select drops after exactly 24 bits.
#[derive(Debug, Default)]
pub struct ThreeWireDecoder {
    last_sclk: bool,
    chip_select: ChipSelect,
    shift: u32,
    bits: u8,
}

impl ThreeWireDecoder {
    pub fn new() -> Self {
        Self {
            last_sclk: true,
            ..Default::default()
        }
    }

    pub fn push(&mut self, value: u32) -> Option<Transaction> {
        let word = ThreeWireWord::from(value);
        let rising = word.sclk && !self.last_sclk;
        self.last_sclk = word.sclk;

        if word.chip_select.is_empty() {
            let bits = std::mem::take(&mut self.bits);
            let shift = std::mem::take(&mut self.shift);
            return match bits {
                0 => None,
                24 => Some(Transaction::new(
                    self.chip_select,
                    (shift >> 16) as u8,
                    (shift & 0xffff) as u16,
                )),
                n => {
                    log::warn!("dropping incomplete 3-wire transaction ({n} bits)");
                    None
                }
            };
        }

        self.chip_select = word.chip_select;
        if rising {
            self.shift = (self.shift << 1) | word.sdata as u32;
            self.bits = self.bits.saturating_add(1);
        }
        None
    }
}
