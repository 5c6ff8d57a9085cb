use std::ops::Range;

use crate::memory::{Endianness, Memory, MemoryError};

/// A single contiguous block of RAM starting at address 0.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    bytes: Vec<u8>,
    endianness: Endianness,
}

impl FlatMemory {
    #[must_use]
    pub fn new(size: u32, endianness: Endianness) -> Self {
        Self {
            bytes: vec![0; size as usize],
            endianness,
        }
    }

    /// Copies `data` into memory starting at `address`.
    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), MemoryError> {
        let width = u32::try_from(data.len()).map_err(|_| MemoryError::OutOfBounds {
            address,
            width: u32::MAX,
            size: self.size(),
        })?;
        let range = self.range(address, width)?;
        self.bytes[range].copy_from_slice(data);

        Ok(())
    }

    /// Writes a sequence of instruction words starting at `address`.
    pub fn load_words(&mut self, address: u32, words: &[u32]) -> Result<(), MemoryError> {
        for (offset, word) in (0..).step_by(4).zip(words) {
            self.write_word(address.wrapping_add(offset), *word)?;
        }

        Ok(())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, address: u32, width: u32) -> Result<Range<usize>, MemoryError> {
        let out_of_bounds = MemoryError::OutOfBounds {
            address,
            width,
            size: self.size(),
        };

        match address.checked_add(width) {
            Some(end) if end <= self.size() => Ok(address as usize..end as usize),
            _ => Err(out_of_bounds),
        }
    }

    fn read_array<const N: usize>(&self, address: u32) -> Result<[u8; N], MemoryError> {
        let range = self.range(address, N as u32)?;
        let mut bytes = [0; N];
        bytes.copy_from_slice(&self.bytes[range]);

        if self.endianness == Endianness::Big {
            bytes.reverse();
        }

        Ok(bytes)
    }

    fn write_array<const N: usize>(
        &mut self,
        address: u32,
        mut bytes: [u8; N],
    ) -> Result<(), MemoryError> {
        let range = self.range(address, N as u32)?;

        if self.endianness == Endianness::Big {
            bytes.reverse();
        }

        self.bytes[range].copy_from_slice(&bytes);

        Ok(())
    }
}

impl Memory for FlatMemory {
    fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn read_byte(&self, address: u32) -> Result<u8, MemoryError> {
        self.read_array::<1>(address).map(|[byte]| byte)
    }

    fn read_half_word(&self, address: u32) -> Result<u16, MemoryError> {
        self.read_array(address).map(u16::from_le_bytes)
    }

    fn read_word(&self, address: u32) -> Result<u32, MemoryError> {
        self.read_array(address).map(u32::from_le_bytes)
    }

    fn write_byte(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        self.write_array(address, [value])
    }

    fn write_half_word(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        self.write_array(address, value.to_le_bytes())
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        self.write_array(address, value.to_le_bytes())
    }
}
