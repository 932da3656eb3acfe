use crate::{Error, Result};

/// A named bit field inside one 16 bit HMCAD1511 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterField {
    pub name: &'static str,
    pub address: u8,
    pub width: u8,
    pub offset: u8,
    pub description: &'static str,
}

impl RegisterField {
    const fn new(
        name: &'static str,
        address: u8,
        width: u8,
        offset: u8,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            address,
            width,
            offset,
            description,
        }
    }

    /// Largest value the field can hold.
    pub fn max_value(&self) -> u16 {
        ((1u32 << self.width) - 1) as u16
    }

    /// Bits of the register word covered by this field.
    pub fn mask(&self) -> u16 {
        self.max_value() << self.offset
    }

    /// Shift `value` into place, refusing values wider than the field.
    pub fn encode(&self, value: u16) -> Result<u16> {
        if value > self.max_value() {
            log::error!(
                "value {value:#x} does not fit {} ({} bits)",
                self.name,
                self.width
            );
            return Err(Error::InvalidArgument(format!(
                "value {value:#x} exceeds {}-bit register {}",
                self.width, self.name
            )));
        }
        Ok(value << self.offset)
    }

    /// Extract this field from a full register word.
    pub fn decode(&self, word: u16) -> u16 {
        (word >> self.offset) & self.max_value()
    }
}

/// The static HMCAD1511 register table.
#[derive(Debug, Clone, Copy)]
pub struct RegisterMap {
    fields: &'static [RegisterField],
}

pub const REGISTER_MAP: RegisterMap = RegisterMap { fields: FIELDS };

impl RegisterMap {
    pub fn lookup(&self, name: &str) -> Result<&'static RegisterField> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterField> {
        self.fields.iter()
    }

    /// All fields living at `address`.
    pub fn at_address(&self, address: u8) -> impl Iterator<Item = &'static RegisterField> {
        self.fields.iter().filter(move |f| f.address == address)
    }

    /// Checks that names are unique, every field fits a 16 bit word and that
    /// fields sharing an address do not overlap.
    pub fn validate(&self) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.width == 0 || field.offset as u32 + field.width as u32 > 16 {
                return Err(Error::InvalidArgument(format!(
                    "register {} does not fit a 16 bit word",
                    field.name
                )));
            }
            for other in &self.fields[i + 1..] {
                if other.name == field.name {
                    return Err(Error::InvalidArgument(format!(
                        "register {} defined twice",
                        field.name
                    )));
                }
                if other.address == field.address && other.mask() & field.mask() != 0 {
                    return Err(Error::InvalidArgument(format!(
                        "registers {} and {} overlap at {:#04x}",
                        field.name, other.name, field.address
                    )));
                }
            }
        }
        Ok(())
    }
}

#[rustfmt::skip]
const FIELDS: &[RegisterField] = &[
    RegisterField::new("rst",               0x00, 1, 0,  "Self-clearing software reset"),
    RegisterField::new("sleep4_ch1",        0x0f, 1, 0,  "Sleep channel 1 in quad channel mode"),
    RegisterField::new("sleep4_ch2",        0x0f, 1, 1,  "Sleep channel 2 in quad channel mode"),
    RegisterField::new("sleep4_ch3",        0x0f, 1, 2,  "Sleep channel 3 in quad channel mode"),
    RegisterField::new("sleep4_ch4",        0x0f, 1, 3,  "Sleep channel 4 in quad channel mode"),
    RegisterField::new("sleep2_ch1",        0x0f, 1, 4,  "Sleep channel 1 in dual channel mode"),
    RegisterField::new("sleep2_ch2",        0x0f, 1, 5,  "Sleep channel 2 in dual channel mode"),
    RegisterField::new("sleep1_ch1",        0x0f, 1, 6,  "Sleep channel 1 in single channel mode"),
    RegisterField::new("sleep",             0x0f, 1, 8,  "Go to sleep mode"),
    RegisterField::new("pd",                0x0f, 1, 9,  "Go to power down"),
    RegisterField::new("pd_pin_cfg",        0x0f, 2, 10, "PD pin function"),
    RegisterField::new("term_lclk",         0x11, 3, 0,  "LVDS termination for LCLK"),
    RegisterField::new("term_frame",        0x11, 3, 4,  "LVDS termination for FCLK"),
    RegisterField::new("term_dat",          0x11, 3, 8,  "LVDS termination for output data"),
    RegisterField::new("en_lvds_term",      0x11, 1, 14, "Enable internal LVDS termination"),
    RegisterField::new("ilvds_lclk",        0x12, 3, 0,  "LVDS current drive for LCLK"),
    RegisterField::new("ilvds_frame",       0x12, 3, 4,  "LVDS current drive for FCLK"),
    RegisterField::new("ilvds_dat",         0x12, 3, 8,  "LVDS current drive for output data"),
    RegisterField::new("invert4_ch1",       0x24, 1, 0,  "Swap inputs of channel 1, quad channel mode"),
    RegisterField::new("invert4_ch2",       0x24, 1, 1,  "Swap inputs of channel 2, quad channel mode"),
    RegisterField::new("invert4_ch3",       0x24, 1, 2,  "Swap inputs of channel 3, quad channel mode"),
    RegisterField::new("invert4_ch4",       0x24, 1, 3,  "Swap inputs of channel 4, quad channel mode"),
    RegisterField::new("invert2_ch1",       0x24, 1, 4,  "Swap inputs of channel 1, dual channel mode"),
    RegisterField::new("invert2_ch2",       0x24, 1, 5,  "Swap inputs of channel 2, dual channel mode"),
    RegisterField::new("invert1_ch1",       0x24, 1, 6,  "Swap inputs of channel 1, single channel mode"),
    RegisterField::new("single_custom_pat", 0x25, 1, 4,  "Output bits_custom1 on all lanes"),
    RegisterField::new("dual_custom_pat",   0x25, 1, 5,  "Alternate bits_custom1 and bits_custom2"),
    RegisterField::new("en_ramp",           0x25, 1, 6,  "Output a ramp pattern"),
    RegisterField::new("bits_custom1",      0x26, 8, 8,  "Custom pattern 1"),
    RegisterField::new("bits_custom2",      0x27, 8, 8,  "Custom pattern 2"),
    RegisterField::new("cgain4_ch1",        0x2a, 4, 0,  "Coarse gain channel 1, quad channel mode"),
    RegisterField::new("cgain4_ch2",        0x2a, 4, 4,  "Coarse gain channel 2, quad channel mode"),
    RegisterField::new("cgain4_ch3",        0x2a, 4, 8,  "Coarse gain channel 3, quad channel mode"),
    RegisterField::new("cgain4_ch4",        0x2a, 4, 12, "Coarse gain channel 4, quad channel mode"),
    RegisterField::new("cgain2_ch1",        0x2b, 4, 0,  "Coarse gain channel 1, dual channel mode"),
    RegisterField::new("cgain2_ch2",        0x2b, 4, 4,  "Coarse gain channel 2, dual channel mode"),
    RegisterField::new("cgain1_ch1",        0x2b, 4, 8,  "Coarse gain channel 1, single channel mode"),
    RegisterField::new("jitter_ctrl",       0x30, 8, 0,  "Clock jitter adjustment"),
    RegisterField::new("channel_num",       0x31, 3, 0,  "Channel mode: 1 single, 2 dual, 4 quad"),
    RegisterField::new("clk_divide",        0x31, 2, 8,  "Input clock divider"),
    RegisterField::new("coarse_gain_cfg",   0x33, 1, 0,  "Coarse gain in dB (0) or x (1) steps"),
    RegisterField::new("fine_gain_en",      0x33, 1, 1,  "Enable fine gain"),
    RegisterField::new("fgain_branch1",     0x34, 7, 0,  "Fine gain branch 1"),
    RegisterField::new("fgain_branch2",     0x34, 7, 8,  "Fine gain branch 2"),
    RegisterField::new("fgain_branch3",     0x35, 7, 0,  "Fine gain branch 3"),
    RegisterField::new("fgain_branch4",     0x35, 7, 8,  "Fine gain branch 4"),
    RegisterField::new("fgain_branch5",     0x36, 7, 0,  "Fine gain branch 5"),
    RegisterField::new("fgain_branch6",     0x36, 7, 8,  "Fine gain branch 6"),
    RegisterField::new("fgain_branch7",     0x37, 7, 0,  "Fine gain branch 7"),
    RegisterField::new("fgain_branch8",     0x37, 7, 8,  "Fine gain branch 8"),
    RegisterField::new("inp_sel_adc1",      0x3a, 5, 0,  "Input routed to ADC core 1"),
    RegisterField::new("inp_sel_adc2",      0x3a, 5, 8,  "Input routed to ADC core 2"),
    RegisterField::new("inp_sel_adc3",      0x3b, 5, 0,  "Input routed to ADC core 3"),
    RegisterField::new("inp_sel_adc4",      0x3b, 5, 8,  "Input routed to ADC core 4"),
    RegisterField::new("phase_ddr",         0x42, 2, 5,  "LCLK phase relative to FCLK"),
    RegisterField::new("pat_deskew",        0x45, 1, 0,  "Deskew pattern (10101010)"),
    RegisterField::new("pat_sync",          0x45, 1, 1,  "Sync pattern (11110000)"),
    RegisterField::new("btc_mode",          0x46, 1, 2,  "Two's complement output"),
    RegisterField::new("msb_first",         0x46, 1, 3,  "Serialize MSB first"),
    RegisterField::new("adc_curr",          0x50, 3, 0,  "ADC core current"),
    RegisterField::new("ext_vcm_bc",        0x50, 2, 5,  "VCM buffer drive"),
    RegisterField::new("lvds_pd_mode",      0x52, 1, 0,  "LVDS outputs in power down"),
    RegisterField::new("low_clk_freq",      0x53, 1, 3,  "Low clock frequency mode"),
    RegisterField::new("lvds_advance",      0x53, 1, 4,  "Advance LVDS data"),
    RegisterField::new("lvds_delay",        0x53, 1, 5,  "Delay LVDS data"),
    RegisterField::new("fs_cntrl",          0x55, 6, 0,  "Full scale adjustment"),
    RegisterField::new("startup_ctrl",      0x56, 3, 0,  "Start-up delay"),
];
