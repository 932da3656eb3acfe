pub mod adc16;
pub mod bus;
pub mod register_map;

pub use bus::RegisterBus;
pub use register_map::{REGISTER_MAP, RegisterField, RegisterMap};

use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The register bus could not complete a request.
    #[error("transport: {0}")]
    Transport(String),
    /// A memory read returned fewer bytes than requested.
    #[error("transfer truncated: got {actual} of {expected} bytes")]
    TransferTruncated {
        /// Actual amount of bytes transferred.
        actual: usize,
        /// Expected number of bytes transferred.
        expected: usize,
    },
    /// The ADC line clock is not locked, calibration is refused.
    #[error("ADC clock not locked (lock bits {lock_bits:#04b})")]
    ClockNotLocked { lock_bits: u8 },
    /// A lane showed errors at every tap of the sweep.
    #[error("chip {chip}: no error-free tap found for lane {lane}")]
    CalibrationWindowEmpty { chip: Chip, lane: Lane },
    /// The sync pattern never lined up with byte 0 of the lane.
    #[error("chip {chip}: lane {lane} not aligned after {attempts} bitslips")]
    BitslipSyncTimeout { chip: Chip, lane: Lane, attempts: u32 },
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Register name not present in the HMCAD1511 register map.
    #[error("unknown register {0}")]
    UnknownRegister(String),
    /// The loaded FPGA design has no ADC16 controller.
    #[error("design is not ADC16 based")]
    NotAdc16Design,
    /// The operation was cancelled or ran past its deadline.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// True for failures that concern a single chip's calibration, as opposed to
    /// board level problems (transport, clock, cancellation).
    pub fn is_chip_failure(&self) -> bool {
        matches!(
            self,
            Error::CalibrationWindowEmpty { .. } | Error::BitslipSyncTimeout { .. }
        )
    }
}

/// Result type for operations that may return an `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// One of the (up to 8) HMCAD1511 chips behind an ADC16 controller.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[repr(u8)]
pub enum Chip {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl Chip {
    pub const ALL: [Chip; 8] = [
        Chip::A,
        Chip::B,
        Chip::C,
        Chip::D,
        Chip::E,
        Chip::F,
        Chip::G,
        Chip::H,
    ];

    /// Chips populated on a SNAP board.
    pub const SNAP: [Chip; 3] = [Chip::A, Chip::B, Chip::C];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Name of the BRAM holding this chip's snapshot.
    pub fn snapshot_region(self) -> String {
        format!("{}{}", adc16::SNAPSHOT_RAM_PREFIX, self.index())
    }
}

impl TryFrom<u8> for Chip {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        Chip::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("chip index {value} out of range")))
    }
}

impl TryFrom<char> for Chip {
    type Error = Error;
    fn try_from(value: char) -> Result<Self> {
        match value.to_ascii_lowercase() {
            c @ 'a'..='h' => Chip::try_from(c as u8 - b'a'),
            _ => Err(Error::InvalidArgument(format!("unknown chip '{value}'"))),
        }
    }
}

impl Display for Chip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", (b'a' + self.index()) as char)
    }
}

/// Chip select mask driven onto the 3-wire bus. Bit n selects chip n.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct ChipSelect(u8);

impl ChipSelect {
    /// All three chips of a SNAP board.
    pub const SNAP_ALL: ChipSelect = ChipSelect(0b111);
    /// Every chip an 8-chip (ROACH) controller supports.
    pub const ALL: ChipSelect = ChipSelect(0xff);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn single(chip: Chip) -> Self {
        Self(1 << chip.index())
    }

    pub fn from_chips(chips: &[Chip]) -> Self {
        Self(chips.iter().fold(0, |mask, chip| mask | 1 << chip.index()))
    }

    pub fn contains(self, chip: Chip) -> bool {
        self.0 & (1 << chip.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Selected chips in ascending order.
    pub fn chips(self) -> impl Iterator<Item = Chip> {
        Chip::ALL.into_iter().filter(move |chip| self.contains(*chip))
    }
}

impl From<Chip> for ChipSelect {
    fn from(chip: Chip) -> Self {
        ChipSelect::single(chip)
    }
}

/// Which of the two byte lanes of an ADC input.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum LaneSide {
    A,
    B,
}

/// One of the 8 logical sub-channels of a chip. The discriminant is the byte
/// offset of the lane inside every 8 byte frame of a snapshot.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[repr(u8)]
pub enum Lane {
    In1A = 0,
    In1B = 1,
    In2A = 2,
    In2B = 3,
    In3A = 4,
    In3B = 5,
    In4A = 6,
    In4B = 7,
}

impl Lane {
    pub const ALL: [Lane; 8] = [
        Lane::In1A,
        Lane::In1B,
        Lane::In2A,
        Lane::In2B,
        Lane::In3A,
        Lane::In3B,
        Lane::In4A,
        Lane::In4B,
    ];

    pub fn offset(self) -> usize {
        self as usize
    }

    /// ADC input number, 1..=4.
    pub fn input(self) -> u8 {
        self as u8 / 2 + 1
    }

    pub fn side(self) -> LaneSide {
        if self as u8 % 2 == 0 {
            LaneSide::A
        } else {
            LaneSide::B
        }
    }
}

impl TryFrom<u8> for Lane {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        Lane::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("lane index {value} out of range")))
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let side = match self.side() {
            LaneSide::A => 'a',
            LaneSide::B => 'b',
        };
        write!(f, "{}{}", self.input(), side)
    }
}

/// IDELAY tap setting of a lane.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default)]
pub struct Tap(u8);

impl Tap {
    pub const MIN: Tap = Tap(0);
    pub const MAX: Tap = Tap(adc16::NUM_TAPS - 1);

    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX.0 {
            log::error!("tap {value} exceeds {}", Self::MAX.0);
            return Err(Error::InvalidArgument(format!("tap {value} out of range 0..=31")));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every tap, 0 through 31.
    pub fn all() -> impl Iterator<Item = Tap> {
        (Self::MIN.0..=Self::MAX.0).map(Tap)
    }
}

impl Display for Tap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Demultiplexing factor. Selects how many analog inputs are active and how
/// their samples interleave in the byte stream.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum DemuxMode {
    /// No interleaving, four inputs (ADC quad channel mode).
    #[default]
    Demux1,
    /// Inputs 1 and 3 interleaved over two cores each (ADC dual channel mode).
    Demux2,
    /// Input 1 interleaved over all four cores (ADC single channel mode).
    Demux4,
}

impl DemuxMode {
    pub fn factor(self) -> u8 {
        match self {
            DemuxMode::Demux1 => 1,
            DemuxMode::Demux2 => 2,
            DemuxMode::Demux4 => 4,
        }
    }

    /// Value of the MM bits in the ADC16 control word.
    pub fn fpga_bits(self) -> u32 {
        match self {
            DemuxMode::Demux1 => 0b00,
            DemuxMode::Demux2 => 0b01,
            DemuxMode::Demux4 => 0b10,
        }
    }

    /// Value of the HMCAD1511 `channel_num` field for this mode.
    pub fn channel_num(self) -> u16 {
        match self {
            DemuxMode::Demux1 => 0b100,
            DemuxMode::Demux2 => 0b010,
            DemuxMode::Demux4 => 0b001,
        }
    }
}

impl TryFrom<u8> for DemuxMode {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DemuxMode::Demux1),
            2 => Ok(DemuxMode::Demux2),
            4 => Ok(DemuxMode::Demux4),
            _ => {
                log::error!("unsupported demux mode {value}");
                Err(Error::InvalidArgument(format!(
                    "demux mode {value} not in {{1, 2, 4}}"
                )))
            }
        }
    }
}

/// Test patterns the calibration uses.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TestPattern {
    /// Free running ramp 0..=255
    Ramp,
    /// Deskew (10101010), reads back as [`adc16::DESKEW_EXPECTED`]
    Deskew,
    /// Sync (11110000), reads back as [`adc16::SYNC_EXPECTED`]
    Sync,
}

impl FromStr for TestPattern {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ramp" => Ok(TestPattern::Ramp),
            "deskew" => Ok(TestPattern::Deskew),
            "sync" => Ok(TestPattern::Sync),
            _ => {
                log::error!("invalid test pattern selected: {s}");
                Err(Error::InvalidArgument(format!("unknown test pattern '{s}'")))
            }
        }
    }
}

impl Display for TestPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestPattern::Ramp => "ramp",
            TestPattern::Deskew => "deskew",
            TestPattern::Sync => "sync",
        };
        f.write_str(name)
    }
}
