//! # Register Names
//!
//! - **R0-R12**: General purpose
//! - **R13 (SP)**: Stack pointer (by convention)
//! - **R14 (LR)**: Link register (return address)
//! - **R15 (PC)**: Program counter, read as the instruction address + 8
//!
//! Which physical register a name refers to depends on the current mode,
//! see [`register_bank`](super::register_bank).

/// Stack Pointer register index.
pub const REG_SP: usize = 0xD;

/// Link Register index (return address for subroutines).
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: usize = 0xF;

/// Assembler name of a visible register.
#[must_use]
pub const fn register_name(reg: usize) -> &'static str {
    const NAMES: [&str; 16] = [
        "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12", "SP",
        "LR", "PC",
    ];

    if reg < NAMES.len() { NAMES[reg] } else { "R?" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names() {
        assert_eq!(register_name(0), "R0");
        assert_eq!(register_name(REG_SP), "SP");
        assert_eq!(register_name(REG_LR), "LR");
        assert_eq!(register_name(REG_PROGRAM_COUNTER), "PC");
        assert_eq!(register_name(16), "R?");
    }
}
