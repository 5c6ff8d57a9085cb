//! # Processor Modes
//!
//! The low five bits of the CPSR select one of seven operating modes. Every
//! mode except User is privileged, and every exception mode has its own copy
//! of some registers:
//!
//! ```text
//! ┌────────┬──────────┬───────────────────────┬──────┐
//! │ Mode   │ M4-M0    │ Banked registers      │ SPSR │
//! ├────────┼──────────┼───────────────────────┼──────┤
//! │ USR    │ 10000    │ -                     │ no   │
//! │ FIQ    │ 10001    │ R8-R14                │ yes  │
//! │ IRQ    │ 10010    │ R13-R14               │ yes  │
//! │ SVC    │ 10011    │ R13-R14               │ yes  │
//! │ ABT    │ 10111    │ R13-R14               │ yes  │
//! │ UND    │ 11011    │ R13-R14               │ yes  │
//! │ SYS    │ 11111    │ - (shares USR bank)   │ no   │
//! └────────┴──────────┴───────────────────────┴──────┘
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// The normal program execution state.
    User = 0b10000,

    /// Fast interrupt handling.
    Fiq = 0b10001,

    /// Used for general-purpose interrupt handling.
    Irq = 0b10010,

    /// Protected mode for the operating system, entered on reset and SWI.
    Supervisor = 0b10011,

    /// Entered after a data or instruction prefetch abort.
    Abort = 0b10111,

    /// Entered when an undefined instruction is executed
    Undefined = 0b11011,

    /// A privileged mode sharing the User registers.
    System = 0b11111,
}

impl Mode {
    pub const ALL: [Self; 7] = [
        Self::User,
        Self::Fiq,
        Self::Irq,
        Self::Supervisor,
        Self::Abort,
        Self::Undefined,
        Self::System,
    ];

    #[must_use]
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::User)
    }

    /// User and System have no saved status register.
    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }

    /// Dense index used to address per-mode tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::User => 0,
            Self::Fiq => 1,
            Self::Irq => 2,
            Self::Supervisor => 3,
            Self::Abort => 4,
            Self::Undefined => 5,
            Self::System => 6,
        }
    }
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(format!("Unexpected value for Mode: 0b{n:05b}")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("USR"),
            Self::Fiq => f.write_str("FIQ"),
            Self::Irq => f.write_str("IRQ"),
            Self::Supervisor => f.write_str("SVC"),
            Self::Abort => f.write_str("ABT"),
            Self::Undefined => f.write_str("UND"),
            Self::System => f.write_str("SYS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_values_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::try_from(u32::from(mode)), Ok(mode));
        }
        assert!(Mode::try_from(0).is_err());
        assert!(Mode::try_from(0b10100).is_err());
    }

    #[test]
    fn privilege_and_spsr() {
        assert!(!Mode::User.is_privileged());
        assert!(Mode::System.is_privileged());
        assert!(!Mode::User.has_spsr());
        assert!(!Mode::System.has_spsr());
        assert!(Mode::Fiq.has_spsr());
        assert!(Mode::Undefined.has_spsr());
    }

    #[test]
    fn names() {
        let names: Vec<String> = Mode::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["USR", "FIQ", "IRQ", "SVC", "ABT", "UND", "SYS"]);
    }
}
