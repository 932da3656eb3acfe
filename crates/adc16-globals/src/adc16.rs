//! ADC16 controller layout.
//!
//! The controller is a block of four 32 bit words on the register bus.
//!
//! Word 0 (3-wire and status):
//! ```text
//!  LL.. NNNN ..RR .... ..CD 7654 3210
//!  LL   line clock locked bits        (read)
//!  NNNN number of supported chips     (read)
//!  RR   board revision                (read)
//!  C    SCLK, D SDATA, 0..7 chip selects (active high)
//! ```
//! Word 1 (control):
//! ```text
//!  .... .WMM .... ...S HGFE DCBA iii. TTTT
//!  W    demux write enable, MM demux mode
//!  S    snapshot request
//!  A..H ISERDES bitslip of chip A..H, iii lane of the bitslip
//!  T    delay tap value (5 bits)
//! ```
//! Word 2 and 3: delay strobes for lanes `a` and `b`, 4 bits per chip, rising
//! edge active.

/// Name of the controller register block.
pub const CONTROLLER: &str = "adc16_controller";

pub const WORD_3WIRE: u32 = 0;
pub const WORD_CONTROL: u32 = 1;
pub const WORD_DELAY_STROBE_A: u32 = 2;
pub const WORD_DELAY_STROBE_B: u32 = 3;

// Word 0
pub const SCLK: u32 = 0x200;
pub const SDATA_SHIFT: u32 = 8;
pub const CHIP_SELECT_MASK: u32 = 0xff;
/// Word 0 value with the clock high and nothing selected.
pub const IDLE: u32 = SCLK;
pub const LOCK_SHIFT: u32 = 24;
pub const LOCK_MASK: u32 = 0b11;
pub const SUPPORTED_CHIPS_SHIFT: u32 = 20;
pub const SUPPORTED_CHIPS_MASK: u32 = 0xf;
pub const REVISION_SHIFT: u32 = 16;
pub const REVISION_MASK: u32 = 0b11;

// Word 1
pub const DELAY_TAP_MASK: u32 = 0x1f;
pub const BITSLIP_LANE_SHIFT: u32 = 5;
pub const BITSLIP_CHIP_SHIFT: u32 = 8;
pub const SNAP_REQ: u32 = 0x0001_0000;
pub const DEMUX_MODE_SHIFT: u32 = 24;
pub const DEMUX_MODE_MASK: u32 = 0b11;
pub const DEMUX_WRITE_ENABLE: u32 = 1 << 26;

// Words 2/3
pub const DELAY_STROBE_BITS_PER_CHIP: u32 = 4;

/// Samples captured per snapshot.
pub const SNAPSHOT_LEN: usize = 1024;
/// Bytes per frame, one per lane.
pub const FRAME_LEN: usize = 8;
pub const SNAPSHOT_RAM_PREFIX: &str = "adc16_wb_ram";

/// Number of IDELAY taps.
pub const NUM_TAPS: u8 = 32;

/// Deskew pattern (10101010) as seen in a snapshot.
pub const DESKEW_EXPECTED: i8 = 0x2a;
/// Sync pattern (11110000) as seen in a snapshot.
pub const SYNC_EXPECTED: i8 = 0x70;

/// Free running counter on the FPGA system clock.
pub const SYS_CLKCOUNTER: &str = "sys_clkcounter";

/// Number of 3-wire control words per register transaction.
pub const TRANSACTION_LEN: usize = 2 + 2 * (8 + 16);

/// Crossbar code routing ADC input `n` (1..=4) to a core.
pub fn input_code(input: u8) -> Option<u16> {
    match input {
        1 => Some(0b00010),
        2 => Some(0b00100),
        3 => Some(0b01000),
        4 => Some(0b10000),
        _ => None,
    }
}
