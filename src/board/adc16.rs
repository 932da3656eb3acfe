pub mod bitslip;
pub mod calibrate;
pub mod snapshot;
pub mod tap_calibration;

use crate::cancel::CancelToken;
use crate::hardware::hmcad1511::{Hmcad1511, PATTERN_SETTLE};
use crate::{Error, Result};
use adc16_globals::adc16::{
    CONTROLLER, LOCK_MASK, LOCK_SHIFT, REVISION_MASK, REVISION_SHIFT, SUPPORTED_CHIPS_MASK,
    SUPPORTED_CHIPS_SHIFT, SYS_CLKCOUNTER, WORD_3WIRE, WORD_CONTROL,
};
use adc16_globals::{ChipSelect, DemuxMode, RegisterBus, TestPattern};
use std::time::{Duration, Instant};

/// Operating mode the chips are brought into and restored to after
/// calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcConfig {
    pub chips: ChipSelect,
    pub demux: DemuxMode,
    /// Coarse gain code, 4 bits.
    pub gain: u16,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            chips: ChipSelect::SNAP_ALL,
            demux: DemuxMode::Demux1,
            gain: 1,
        }
    }
}

/// Knobs of the calibration loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSettings {
    /// Wait after switching a test pattern.
    pub pattern_settle: Duration,
    /// Bitslips tried per lane whose eye touches tap 0 or 31.
    pub edge_check_retries: u32,
    /// Bitslips tried per lane before giving up on the sync pattern.
    pub bitslip_retries: u32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            pattern_settle: PATTERN_SETTLE,
            edge_check_retries: 1,
            bitslip_retries: 10,
        }
    }
}

/// An FPGA design with an ADC16 controller and its HMCAD1511 chips.
///
/// Owns the register bus, so all 3-wire transactions and control word
/// sequences of one board are serialized through `&mut self`.
pub struct Adc16<B> {
    adc: Hmcad1511<B>,
    settings: CalibrationSettings,
    cancel: CancelToken,
}

impl<B: RegisterBus> Adc16<B> {
    /// Wraps `bus` after checking that the loaded design has an ADC16
    /// controller.
    pub fn new(bus: B) -> Result<Self> {
        Self::with_settings(bus, CalibrationSettings::default())
    }

    pub fn with_settings(mut bus: B, settings: CalibrationSettings) -> Result<Self> {
        if !Self::is_adc16_based(&mut bus)? {
            log::error!("design has no {CONTROLLER}");
            return Err(Error::NotAdc16Design);
        }
        let mut adc = Hmcad1511::new(bus);
        adc.set_pattern_settle(settings.pattern_settle);
        Ok(Self {
            adc,
            settings,
            cancel: CancelToken::new(),
        })
    }

    pub fn is_adc16_based(bus: &mut B) -> Result<bool> {
        Ok(bus.list_registers()?.contains(CONTROLLER))
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CalibrationSettings) {
        self.adc.set_pattern_settle(settings.pattern_settle);
        self.settings = settings;
    }

    /// A handle that cancels the calibration running on this board.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn set_cancel_token(&mut self, cancel: CancelToken) {
        self.cancel = cancel;
    }

    pub fn adc(&mut self) -> &mut Hmcad1511<B> {
        &mut self.adc
    }

    pub fn bus(&self) -> &B {
        self.adc.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.adc.bus_mut()
    }

    pub fn into_bus(self) -> B {
        self.adc.into_bus()
    }

    pub(crate) fn write_control(&mut self, word_offset: u32, value: u32) -> Result<()> {
        self.adc
            .bus_mut()
            .write_register(CONTROLLER, value, word_offset)
    }

    /// Status half of control word 0.
    pub fn status(&mut self) -> Result<u32> {
        self.adc.bus_mut().read_register(CONTROLLER, WORD_3WIRE)
    }

    pub fn lock_bits(&mut self) -> Result<u8> {
        Ok(((self.status()? >> LOCK_SHIFT) & LOCK_MASK) as u8)
    }

    pub fn clock_locked(&mut self) -> Result<bool> {
        let locked = self.lock_bits()? != 0;
        if locked {
            log::info!("ADC clock is locked");
        } else {
            log::info!("ADC clock not locked, check clock and demux mode");
        }
        Ok(locked)
    }

    /// Number of chips the controller was built for.
    pub fn supported_chips(&mut self) -> Result<u8> {
        Ok(((self.status()? >> SUPPORTED_CHIPS_SHIFT) & SUPPORTED_CHIPS_MASK) as u8)
    }

    pub fn revision(&mut self) -> Result<u8> {
        Ok(((self.status()? >> REVISION_SHIFT) & REVISION_MASK) as u8)
    }

    /// Approximate FPGA clock in MHz, from two reads of the free running
    /// clock counter `interval` apart.
    pub fn estimate_board_clock(&mut self, interval: Duration) -> Result<f64> {
        if interval.is_zero() {
            return Err(Error::InvalidArgument(
                "clock estimate needs a non-zero interval".to_string(),
            ));
        }
        let first = self.adc.bus_mut().read_register(SYS_CLKCOUNTER, 0)?;
        let start = Instant::now();
        std::thread::sleep(interval);
        let second = self.adc.bus_mut().read_register(SYS_CLKCOUNTER, 0)?;
        let elapsed = start.elapsed();

        // one counter wrap at most
        let ticks = second.wrapping_sub(first);
        let mhz = ticks as f64 / elapsed.as_secs_f64() / 1e6;
        log::info!("board clock: {mhz:.4} MHz");
        Ok(mhz)
    }

    pub fn set_chip_select(&mut self, chips: ChipSelect) {
        self.adc.set_chip_select(chips);
    }

    /// Rearrange the sample bytes inside the FPGA for `mode`.
    pub fn fpga_set_demux(&mut self, mode: DemuxMode) -> Result<()> {
        log::debug!("FPGA demux {}", mode.factor());
        self.write_control(WORD_CONTROL, adc16_wire::control::demux(mode))
    }

    /// Set the demux mode on the chips and in the FPGA.
    pub fn set_demux(&mut self, mode: DemuxMode) -> Result<()> {
        self.adc.set_channel_mode(mode)?;
        self.fpga_set_demux(mode)
    }

    pub fn set_gain(&mut self, gain: u16, mode: DemuxMode) -> Result<()> {
        self.adc.set_gain(gain, mode)
    }

    pub fn set_inputs(&mut self, inputs: &[u8]) -> Result<()> {
        self.adc.set_inputs(inputs)
    }

    pub fn enable_pattern(&mut self, pattern: TestPattern) -> Result<()> {
        self.adc.enable_pattern(pattern)
    }

    pub fn clear_pattern(&mut self) -> Result<()> {
        self.adc.clear_pattern()
    }

    /// Bring the chips of `config` into a known operating mode.
    pub fn initialize(&mut self, config: &AdcConfig) -> Result<()> {
        log::info!("initializing ADC");
        self.set_chip_select(config.chips);
        self.adc.reset()?;
        self.set_demux(config.demux)?;
        self.set_gain(config.gain, config.demux)?;
        self.adc.power_cycle()
    }
}
