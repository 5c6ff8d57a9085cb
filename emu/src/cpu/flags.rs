//! Single-bit instruction fields, decoded into named variants.

/// Width of a single data transfer (B bit).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteKind {
    #[default]
    Word,

    Byte,
}

impl From<bool> for ReadWriteKind {
    fn from(value: bool) -> Self {
        if value { Self::Byte } else { Self::Word }
    }
}

/// Direction of a transfer (L bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStoreKind {
    Store,
    Load,
}

impl From<bool> for LoadStoreKind {
    fn from(b: bool) -> Self {
        if b { Self::Load } else { Self::Store }
    }
}

impl std::fmt::Display for LoadStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => f.write_str("STR"),
            Self::Load => f.write_str("LDR"),
        }
    }
}

/// P bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    /// Add offset after transfer.
    Post,

    /// Add offset before transfer.
    Pre,
}

impl From<bool> for Indexing {
    fn from(state: bool) -> Self {
        if state { Self::Pre } else { Self::Post }
    }
}

/// U bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offsetting {
    /// Subtract the offset from base.
    Down,

    /// Add the offset to base.
    Up,
}

impl Offsetting {
    #[must_use]
    pub const fn apply(self, base: u32, offset: u32) -> u32 {
        match self {
            Self::Down => base.wrapping_sub(offset),
            Self::Up => base.wrapping_add(offset),
        }
    }
}

impl From<bool> for Offsetting {
    fn from(state: bool) -> Self {
        if state { Self::Up } else { Self::Down }
    }
}

/// I bit of data processing instructions.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperandKind {
    Immediate,
    Register,
}

impl From<bool> for OperandKind {
    fn from(b: bool) -> Self {
        if b { Self::Immediate } else { Self::Register }
    }
}

/// Barrel shifter operation, bits 6-5 of a register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl From<u32> for ShiftKind {
    fn from(op: u32) -> Self {
        match op & 0b11 {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lsl => f.write_str("LSL"),
            Self::Lsr => f.write_str("LSR"),
            Self::Asr => f.write_str("ASR"),
            Self::Ror => f.write_str("ROR"),
        }
    }
}
