//! # Conditional Execution
//!
//! Every ARM instruction carries a condition in bits 31-28 and only takes
//! effect when the CPSR flags satisfy it:
//!
//! ```text
//! ┌───────┬────────┬─────────────────────┬──────────────────┐
//! │ Code  │ Suffix │     Meaning         │   Flags Tested   │
//! ├───────┼────────┼─────────────────────┼──────────────────┤
//! │ 0000  │   EQ   │ Equal               │ Z=1              │
//! │ 0001  │   NE   │ Not equal           │ Z=0              │
//! │ 0010  │   CS   │ Carry set / ≥ (uns) │ C=1              │
//! │ 0011  │   CC   │ Carry clear / < (u) │ C=0              │
//! │ 0100  │   MI   │ Minus / negative    │ N=1              │
//! │ 0101  │   PL   │ Plus / non-negative │ N=0              │
//! │ 0110  │   VS   │ Overflow set        │ V=1              │
//! │ 0111  │   VC   │ Overflow clear      │ V=0              │
//! │ 1000  │   HI   │ Higher (unsigned)   │ C=1 AND Z=0      │
//! │ 1001  │   LS   │ Lower/same (unsig)  │ C=0 OR Z=1       │
//! │ 1010  │   GE   │ ≥ (signed)          │ N=V              │
//! │ 1011  │   LT   │ < (signed)          │ N≠V              │
//! │ 1100  │   GT   │ > (signed)          │ Z=0 AND N=V      │
//! │ 1101  │   LE   │ ≤ (signed)          │ Z=1 OR N≠V       │
//! │ 1110  │   AL   │ Always              │ -                │
//! │ 1111  │   NV   │ Reserved            │ -                │
//! └───────┴────────┴─────────────────────┴──────────────────┘
//! ```
//!
//! The fourteen flag-dependent conditions are evaluated once, for all sixteen
//! NZCV combinations, when a [`ConditionTable`] is built. Checking an
//! instruction is then a single lookup indexed by condition and flag nibble.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    CS = 0x2,
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    AL = 0xE,
    /// Reserved since ARMv3, raises an undefined instruction.
    NV = 0xF,
}

impl Condition {
    /// Evaluates the condition against a NZCV nibble (N in bit 3).
    #[must_use]
    pub fn holds(self, flags: u8) -> bool {
        let n = flags.get_bit(3);
        let z = flags.get_bit(2);
        let c = flags.get_bit(1);
        let v = flags.get_bit(0);

        match self {
            Self::EQ => z,
            Self::NE => !z,
            Self::CS => c,
            Self::CC => !c,
            Self::MI => n,
            Self::PL => !n,
            Self::VS => v,
            Self::VC => !v,
            Self::HI => c && !z,
            Self::LS => !c || z,
            Self::GE => n == v,
            Self::LT => n != v,
            Self::GT => !z && n == v,
            Self::LE => z || n != v,
            Self::AL => true,
            Self::NV => false,
        }
    }
}

impl From<u8> for Condition {
    fn from(item: u8) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EQ => f.write_str("EQ"),
            Self::NE => f.write_str("NE"),
            Self::CS => f.write_str("CS"),
            Self::CC => f.write_str("CC"),
            Self::MI => f.write_str("MI"),
            Self::PL => f.write_str("PL"),
            Self::VS => f.write_str("VS"),
            Self::VC => f.write_str("VC"),
            Self::HI => f.write_str("HI"),
            Self::LS => f.write_str("LS"),
            Self::GE => f.write_str("GE"),
            Self::LT => f.write_str("LT"),
            Self::GT => f.write_str("GT"),
            Self::LE => f.write_str("LE"),
            Self::AL => Ok(()),
            Self::NV => f.write_str("NV"),
        }
    }
}

/// Precomputed pass/fail answers for conditions `EQ..=LE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTable([[bool; 16]; 14]);

impl ConditionTable {
    #[must_use]
    pub fn new() -> Self {
        let mut table = [[false; 16]; 14];
        for (code, row) in (0_u8..).zip(table.iter_mut()) {
            let condition = Condition::from(code);
            for (flags, passes) in (0_u8..).zip(row.iter_mut()) {
                *passes = condition.holds(flags);
            }
        }

        Self(table)
    }

    /// `AL` always passes. `NV` never does: the dispatcher rejects it
    /// before asking.
    #[must_use]
    pub fn passes(&self, condition: Condition, flags: u8) -> bool {
        match condition {
            Condition::AL => true,
            Condition::NV => false,
            _ => self.0[condition as usize][usize::from(flags & 0xF)],
        }
    }
}

impl Default for ConditionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_matches_flag_formulas() {
        let table = ConditionTable::new();

        for code in 0..16_u8 {
            for flags in 0..16_u8 {
                let (n, z, c, v) = (
                    flags & 0b1000 != 0,
                    flags & 0b0100 != 0,
                    flags & 0b0010 != 0,
                    flags & 0b0001 != 0,
                );
                let expected = match code {
                    0x0 => z,
                    0x1 => !z,
                    0x2 => c,
                    0x3 => !c,
                    0x4 => n,
                    0x5 => !n,
                    0x6 => v,
                    0x7 => !v,
                    0x8 => c && !z,
                    0x9 => !c || z,
                    0xA => n == v,
                    0xB => n != v,
                    0xC => !z && n == v,
                    0xD => z || n != v,
                    0xE => true,
                    _ => false,
                };

                assert_eq!(
                    table.passes(Condition::from(code), flags),
                    expected,
                    "condition {code:#X} flags {flags:04b}"
                );
            }
        }
    }

    #[test]
    fn always_ignores_flags() {
        let table = ConditionTable::default();
        for flags in 0..16 {
            assert!(table.passes(Condition::AL, flags));
        }
    }

    #[test]
    fn decode_and_display() {
        assert_eq!(Condition::from(0xB), Condition::LT);
        assert_eq!(Condition::from(0xE).to_string(), "");
        assert_eq!(Condition::GE.to_string(), "GE");
    }
}
