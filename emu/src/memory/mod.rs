//! # Memory Interface
//!
//! The core talks to memory only through the [`Memory`] trait: byte, halfword
//! and word reads and writes that either succeed or report a [`MemoryError`].
//! The load/store unit turns a failed access into a data abort, the fetch
//! stage into a prefetch abort.
//!
//! Multi-byte values use the byte order chosen when the memory is created
//! (see [`Endianness`]). Alignment is not enforced here: the core decides
//! which unaligned accesses are meaningful.

pub mod flat_memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte order used to assemble halfwords and words.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("{width}-byte access at 0x{address:08X} is outside memory of {size} bytes")]
    OutOfBounds { address: u32, width: u32, size: u32 },
}

/// A byte-addressable memory seen by the core.
pub trait Memory {
    /// Number of addressable bytes, valid addresses are `0..size`.
    fn size(&self) -> u32;

    fn endianness(&self) -> Endianness;

    fn read_byte(&self, address: u32) -> Result<u8, MemoryError>;

    fn read_half_word(&self, address: u32) -> Result<u16, MemoryError>;

    fn read_word(&self, address: u32) -> Result<u32, MemoryError>;

    fn write_byte(&mut self, address: u32, value: u8) -> Result<(), MemoryError>;

    fn write_half_word(&mut self, address: u32, value: u16) -> Result<(), MemoryError>;

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), MemoryError>;
}
