use adc16_globals::adc16::{
    BITSLIP_CHIP_SHIFT, BITSLIP_LANE_SHIFT, DELAY_STROBE_BITS_PER_CHIP, DELAY_TAP_MASK,
    DEMUX_MODE_MASK, DEMUX_MODE_SHIFT, DEMUX_WRITE_ENABLE, SNAP_REQ,
};
use adc16_globals::{Chip, DemuxMode, Lane, LaneSide, Tap};

/// Control word 1 value that bit-slips `lane` of `chip`.
pub fn bitslip(chip: Chip, lane: Lane) -> u32 {
    (1 << (BITSLIP_CHIP_SHIFT + chip.index() as u32)) | ((lane as u32) << BITSLIP_LANE_SHIFT)
}

/// Control word 1 value that latches `mode` into the FPGA demultiplexer.
pub fn demux(mode: DemuxMode) -> u32 {
    DEMUX_WRITE_ENABLE | (mode.fpga_bits() << DEMUX_MODE_SHIFT)
}

pub fn delay_tap(tap: Tap) -> u32 {
    tap.value() as u32 & DELAY_TAP_MASK
}

pub fn snap_request() -> u32 {
    SNAP_REQ
}

/// Decoded fields of control word 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlWord {
    pub tap: u8,
    pub bitslip_lane: u8,
    /// One bit per chip.
    pub bitslip_chips: u8,
    pub snap_request: bool,
    pub demux: Option<DemuxMode>,
}

impl From<u32> for ControlWord {
    fn from(word: u32) -> Self {
        let demux = if word & DEMUX_WRITE_ENABLE != 0 {
            match (word >> DEMUX_MODE_SHIFT) & DEMUX_MODE_MASK {
                0b00 => Some(DemuxMode::Demux1),
                0b01 => Some(DemuxMode::Demux2),
                0b10 => Some(DemuxMode::Demux4),
                _ => None,
            }
        } else {
            None
        };
        Self {
            tap: (word & DELAY_TAP_MASK) as u8,
            bitslip_lane: ((word >> BITSLIP_LANE_SHIFT) & 0b111) as u8,
            bitslip_chips: ((word >> BITSLIP_CHIP_SHIFT) & 0xff) as u8,
            snap_request: word & SNAP_REQ != 0,
            demux,
        }
    }
}

/// A delay strobe on control word 2 (lane `a`) or 3 (lane `b`).
///
/// Each chip owns 4 bits starting at `chip * 4`; bit `input - 1` of that
/// nibble strobes the lane of that input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayStrobe {
    pub side: LaneSide,
    pub value: u32,
}

impl DelayStrobe {
    /// Strobe every input of `chip` on one side.
    pub fn broadcast(chip: Chip, side: LaneSide) -> Self {
        Self {
            side,
            value: 0xf << (chip.index() as u32 * DELAY_STROBE_BITS_PER_CHIP),
        }
    }

    /// Strobe a single lane.
    pub fn lane(chip: Chip, lane: Lane) -> Self {
        Self {
            side: lane.side(),
            value: (1 << (lane.input() - 1)) << (chip.index() as u32 * DELAY_STROBE_BITS_PER_CHIP),
        }
    }

    /// Word offset of the strobe register for this side.
    pub fn word_offset(&self) -> u32 {
        match self.side {
            LaneSide::A => adc16_globals::adc16::WORD_DELAY_STROBE_A,
            LaneSide::B => adc16_globals::adc16::WORD_DELAY_STROBE_B,
        }
    }

    /// Lanes strobed by a raw word value on `side`.
    pub fn strobed_lanes(side: LaneSide, value: u32) -> impl Iterator<Item = (Chip, Lane)> {
        Chip::ALL.into_iter().flat_map(move |chip| {
            let nibble = (value >> (chip.index() as u32 * DELAY_STROBE_BITS_PER_CHIP)) & 0xf;
            Lane::ALL
                .into_iter()
                .filter(move |lane| lane.side() == side && nibble & (1 << (lane.input() - 1)) != 0)
                .map(move |lane| (chip, lane))
        })
    }
}
