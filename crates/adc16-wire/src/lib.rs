//! Bit level encoding of the ADC16 controller words.
//!
//! [`three_wire`] turns HMCAD1511 register writes into the sequence of word 0
//! values that bit-bang the 3-wire serial interface, and back.
//! [`control`] packs and unpacks words 1 to 3 (bitslip, snapshot trigger,
//! demux mode, delay taps and strobes).

pub mod control;
pub mod three_wire;

pub use control::{ControlWord, DelayStrobe};
pub use three_wire::{ThreeWireDecoder, ThreeWireWord, Transaction};
