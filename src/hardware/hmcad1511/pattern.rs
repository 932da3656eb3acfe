use crate::hardware::hmcad1511::Hmcad1511;
use crate::Result;
use adc16_globals::{RegisterBus, TestPattern};

impl<B: RegisterBus> Hmcad1511<B> {
    /// Replace the sampled data of every selected chip with `pattern`.
    ///
    /// Both pattern registers are cleared first, so at most one pattern is
    /// active afterwards. Blocks for the pattern settle time.
    pub fn enable_pattern(&mut self, pattern: TestPattern) -> Result<()> {
        log::debug!("enabling {pattern} pattern");
        self.clear_pattern()?;
        match pattern {
            TestPattern::Ramp => self.write_register("en_ramp", 1)?,
            TestPattern::Deskew => self.write_register("pat_deskew", 1)?,
            TestPattern::Sync => self.write_register("pat_sync", 1)?,
        }
        if !self.pattern_settle().is_zero() {
            std::thread::sleep(self.pattern_settle());
        }
        Ok(())
    }

    /// Back to sampled data.
    pub fn clear_pattern(&mut self) -> Result<()> {
        self.write_register("en_ramp", 0)?;
        // also clears pat_sync, which shares the address
        self.write_register("pat_deskew", 0)
    }
}
