use crate::{Error, Result};
use std::collections::BTreeSet;

/// Register level access to a running FPGA design.
///
/// Registers are addressed by name and a 32 bit word offset inside the
/// register. Writes are blind, no read-back verification is performed.
pub trait RegisterBus {
    fn write_register(&mut self, name: &str, value: u32, word_offset: u32) -> Result<()>;

    /// Read exactly `byte_count` bytes from `region`, starting at byte `offset`.
    fn read_memory(&mut self, region: &str, byte_count: usize, offset: usize) -> Result<Vec<u8>>;

    /// Read one big endian 32 bit word.
    fn read_register(&mut self, name: &str, word_offset: u32) -> Result<u32> {
        let bytes = self.read_memory(name, 4, word_offset as usize * 4)?;
        let word: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::TransferTruncated {
                actual: bytes.len(),
                expected: 4,
            })?;
        Ok(u32::from_be_bytes(word))
    }

    fn is_connected(&self) -> bool;

    /// Names of every register the loaded design exposes.
    fn list_registers(&mut self) -> Result<BTreeSet<String>>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn write_register(&mut self, name: &str, value: u32, word_offset: u32) -> Result<()> {
        (**self).write_register(name, value, word_offset)
    }

    fn read_memory(&mut self, region: &str, byte_count: usize, offset: usize) -> Result<Vec<u8>> {
        (**self).read_memory(region, byte_count, offset)
    }

    fn read_register(&mut self, name: &str, word_offset: u32) -> Result<u32> {
        (**self).read_register(name, word_offset)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn list_registers(&mut self) -> Result<BTreeSet<String>> {
        (**self).list_registers()
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn write_register(&mut self, name: &str, value: u32, word_offset: u32) -> Result<()> {
        (**self).write_register(name, value, word_offset)
    }

    fn read_memory(&mut self, region: &str, byte_count: usize, offset: usize) -> Result<Vec<u8>> {
        (**self).read_memory(region, byte_count, offset)
    }

    fn read_register(&mut self, name: &str, word_offset: u32) -> Result<u32> {
        (**self).read_register(name, word_offset)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn list_registers(&mut self) -> Result<BTreeSet<String>> {
        (**self).list_registers()
    }
}
