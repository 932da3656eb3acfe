pub mod pattern;

use crate::{Error, Result};
use adc16_globals::adc16::{CONTROLLER, WORD_3WIRE, input_code};
use adc16_globals::{ChipSelect, DemuxMode, REGISTER_MAP, RegisterBus};
use adc16_wire::Transaction;
use std::time::Duration;

/// Time the chips need before a newly selected test pattern shows up in
/// snapshots.
pub const PATTERN_SETTLE: Duration = Duration::from_secs(1);

/// The HMCAD1511 chips behind an ADC16 controller, programmed through the
/// bit-banged 3-wire interface on control word 0.
///
/// Every register write goes to all chips in the current chip select.
pub struct Hmcad1511<B> {
    bus: B,
    chip_select: ChipSelect,
    pattern_settle: Duration,
}

impl<B: RegisterBus> Hmcad1511<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            chip_select: ChipSelect::SNAP_ALL,
            pattern_settle: PATTERN_SETTLE,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    pub fn set_chip_select(&mut self, chip_select: ChipSelect) {
        log::debug!("chip select {:#05b}", chip_select.bits());
        self.chip_select = chip_select;
    }

    pub fn pattern_settle(&self) -> Duration {
        self.pattern_settle
    }

    pub fn set_pattern_settle(&mut self, settle: Duration) {
        self.pattern_settle = settle;
    }

    /// Write a full 16 bit register of every selected chip.
    ///
    /// There is no acknowledge on the 3-wire bus, a failed transaction only
    /// shows up in the sampled data.
    pub fn write(&mut self, address: u8, data: u16) -> Result<()> {
        let transaction = Transaction::new(self.chip_select, address, data);
        log::debug!("3-wire write {transaction}");
        for word in transaction.encode() {
            self.bus.write_register(CONTROLLER, word, WORD_3WIRE)?;
        }
        Ok(())
    }

    /// Write a named register field.
    ///
    /// The whole register word is written, other fields at the same address
    /// are cleared.
    pub fn write_register(&mut self, name: &str, value: u16) -> Result<()> {
        let field = REGISTER_MAP.lookup(name)?;
        let data = field.encode(value)?;
        self.write(field.address, data)
    }

    /// Write several fields that live at the same address in one transaction.
    pub fn write_shared_registers(&mut self, values: &[(&str, u16)]) -> Result<()> {
        let mut address = None;
        let mut data = 0u16;
        for (name, value) in values {
            let field = REGISTER_MAP.lookup(name)?;
            match address {
                None => address = Some(field.address),
                Some(a) if a != field.address => {
                    log::error!("{name} is not located at {a:#04x}");
                    return Err(Error::InvalidArgument(
                        "all registers must reside at the same address".to_string(),
                    ));
                }
                Some(_) => {}
            }
            data |= field.encode(*value)?;
        }

        match address {
            Some(address) => self.write(address, data),
            None => Err(Error::InvalidArgument("no registers given".to_string())),
        }
    }

    pub fn reset(&mut self) -> Result<()> {
        self.write_register("rst", 1)
    }

    pub fn power_down(&mut self) -> Result<()> {
        self.write_register("pd", 1)
    }

    pub fn power_up(&mut self) -> Result<()> {
        self.write_register("pd", 0)
    }

    pub fn power_cycle(&mut self) -> Result<()> {
        self.power_down()?;
        self.power_up()
    }

    /// Select the channel mode matching `mode` and route the inputs used in it.
    pub fn set_channel_mode(&mut self, mode: DemuxMode) -> Result<()> {
        self.write_register("channel_num", mode.channel_num())?;
        match mode {
            DemuxMode::Demux1 => {
                log::info!("routing all four inputs to their own ADC cores");
                self.set_inputs(&[1, 2, 3, 4])
            }
            DemuxMode::Demux2 => {
                log::info!("interleaving inputs 1 and 3");
                self.set_inputs(&[1, 3])
            }
            DemuxMode::Demux4 => {
                log::info!("interleaving input 1 over all cores");
                self.set_inputs(&[1])
            }
        }
    }

    /// Route analog inputs (1..=4) to the four ADC cores.
    ///
    /// One input feeds every core, two inputs feed two cores each, four
    /// inputs map one to one.
    pub fn set_inputs(&mut self, inputs: &[u8]) -> Result<()> {
        let codes = inputs
            .iter()
            .map(|input| {
                input_code(*input)
                    .ok_or_else(|| Error::InvalidArgument(format!("no analog input {input}")))
            })
            .collect::<Result<Vec<u16>>>()?;

        let cores = match codes.as_slice() {
            [a] => [*a, *a, *a, *a],
            [a, b] => [*a, *a, *b, *b],
            [a, b, c, d] => [*a, *b, *c, *d],
            _ => {
                log::error!("cannot route {} inputs", inputs.len());
                return Err(Error::InvalidArgument(format!(
                    "number of inputs ({}) must be 1, 2 or 4",
                    inputs.len()
                )));
            }
        };

        self.write_shared_registers(&[("inp_sel_adc1", cores[0]), ("inp_sel_adc2", cores[1])])?;
        self.write_shared_registers(&[("inp_sel_adc3", cores[2]), ("inp_sel_adc4", cores[3])])
    }

    /// Coarse gain of the channels active in `mode`.
    pub fn set_gain(&mut self, gain: u16, mode: DemuxMode) -> Result<()> {
        log::debug!("coarse gain {gain} for demux {}", mode.factor());
        match mode {
            DemuxMode::Demux1 => self.write_shared_registers(&[
                ("cgain4_ch1", gain),
                ("cgain4_ch2", gain),
                ("cgain4_ch3", gain),
                ("cgain4_ch4", gain),
            ]),
            DemuxMode::Demux2 => {
                self.write_shared_registers(&[("cgain2_ch1", gain), ("cgain2_ch2", gain)])
            }
            DemuxMode::Demux4 => self.write_register("cgain1_ch1", gain),
        }
    }
}
