//! Control and SERDES calibration of HMCAD1511 ADCs behind a CASPER ADC16
//! controller, as found on the SNAP board (and, with up to 8 chips, on ROACH
//! style digitizers).
//!
//! The FPGA design is reached through a [`RegisterBus`], which addresses
//! registers by name. Everything else happens on top of the four words of the
//! `adc16_controller` register:
//! - HMCAD1511 registers are written by bit-banging the 3-wire interface on
//!   word 0 ([`hardware::hmcad1511::Hmcad1511`]),
//! - snapshots, bitslips, demux mode and delay taps are driven through words
//!   1 to 3 ([`Adc16`]).
//!
//! ## Usage overview
//!
//! ```no_run
//! # fn run<B: libadc16_rs::RegisterBus>(bus: B) -> libadc16_rs::Result<()> {
//! use libadc16_rs::{Adc16, AdcConfig};
//!
//! let mut adc = Adc16::new(bus)?;
//! let config = AdcConfig::default();
//! adc.initialize(&config)?;
//! let report = adc.calibrate_all_chips(&config)?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! Calibration runs per chip:
//! 1. sweep all 32 delay taps with the deskew pattern and count errors per lane,
//! 2. bitslip lanes whose error free window touches tap 0 or 31 and sweep again,
//! 3. program every lane to the center of its error free window,
//! 4. bitslip every lane until the sync pattern sits at its place in the frame.
//!
//! Several boards can be calibrated concurrently with
//! [`manager::calibrate_boards`].
//!
//! ### Datasheets
//! [HMCAD1511 Datasheet](https://www.analog.com/media/en/technical-documentation/data-sheets/hmcad1511.pdf)

pub mod board;
pub mod cancel;
pub mod hardware;
pub mod manager;

pub use board::adc16::calibrate::{BoardCalibration, ChipCalibration};
pub use board::adc16::snapshot::Snapshot;
pub use board::adc16::tap_calibration::{ErrorMatrix, GoodTapWindow};
pub use board::adc16::{Adc16, AdcConfig, CalibrationSettings};
pub use cancel::CancelToken;

pub use adc16_globals::*;
