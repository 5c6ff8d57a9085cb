//! # Banked Register File
//!
//! All 31 general-purpose registers of the core live in one flat array. A
//! logical register number is turned into a physical slot by looking at the
//! current mode:
//!
//! ```text
//!           R0-R7   R8-R12   R13-R14   R15
//! USR/SYS   0-7     8-12     13-14     15
//! FIQ       0-7     16-20    21-22     15
//! IRQ       0-7     8-12     23-24     15
//! SVC       0-7     8-12     25-26     15
//! ABT       0-7     8-12     27-28     15
//! UND       0-7     8-12     29-30     15
//! ```
//!
//! The table is fixed: it is built once from [`BankMap::physical_slot`] and
//! never mutated. Changing mode only changes which row is consulted, nothing
//! is copied around.

use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::Psr;
use crate::cpu::registers::REG_PROGRAM_COUNTER;

/// Number of physical general-purpose registers.
pub const PHYSICAL_REGISTERS: usize = 31;

/// Number of saved status registers (FIQ, IRQ, SVC, ABT, UND).
const SAVED_PSRS: usize = 5;

/// Immutable `(mode, register) -> physical slot` lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankMap([[u8; 16]; 7]);

impl BankMap {
    #[must_use]
    pub fn new() -> Self {
        let mut table = [[0; 16]; 7];
        for mode in Mode::ALL {
            for (reg, slot) in table[mode.index()].iter_mut().enumerate() {
                *slot = Self::physical_slot(mode, reg) as u8;
            }
        }

        Self(table)
    }

    /// Where logical register `reg` of `mode` is stored.
    #[must_use]
    pub const fn physical_slot(mode: Mode, reg: usize) -> usize {
        match (mode, reg) {
            (Mode::Fiq, 8..=14) => 16 + reg - 8,
            (Mode::Irq, 13..=14) => 23 + reg - 13,
            (Mode::Supervisor, 13..=14) => 25 + reg - 13,
            (Mode::Abort, 13..=14) => 27 + reg - 13,
            (Mode::Undefined, 13..=14) => 29 + reg - 13,
            _ => reg,
        }
    }

    /// Table lookup of [`Self::physical_slot`].
    ///
    /// # Panics
    ///
    /// When `reg` is not a register number (0-15).
    #[must_use]
    pub fn slot(&self, mode: Mode, reg: usize) -> usize {
        usize::from(self.0[mode.index()][reg])
    }
}

impl Default for BankMap {
    fn default() -> Self {
        Self::new()
    }
}

const fn spsr_index(mode: Mode) -> Option<usize> {
    match mode {
        Mode::Fiq => Some(0),
        Mode::Irq => Some(1),
        Mode::Supervisor => Some(2),
        Mode::Abort => Some(3),
        Mode::Undefined => Some(4),
        Mode::User | Mode::System => None,
    }
}

/// The register file: physical registers, CPSR and the five SPSRs.
///
/// Every accessor resolves the logical register through the mode currently
/// held in the CPSR, so a mode change through [`RegisterBank::set_cpsr`]
/// immediately switches the visible bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterBank {
    physical: [u32; PHYSICAL_REGISTERS],
    cpsr: Psr,
    spsr: [Psr; SAVED_PSRS],

    #[serde(skip)]
    map: BankMap,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    /// All registers cleared, User mode, ARM state, interrupts enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            physical: [0; PHYSICAL_REGISTERS],
            cpsr: Psr::from(Mode::User),
            spsr: [Psr::default(); SAVED_PSRS],
            map: BankMap::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.cpsr.mode()
    }

    #[must_use]
    pub fn in_privileged_mode(&self) -> bool {
        self.mode().is_privileged()
    }

    #[must_use]
    pub fn current_mode_has_spsr(&self) -> bool {
        self.mode().has_spsr()
    }

    /// Reads a register of the current mode.
    #[must_use]
    pub fn read(&self, reg: usize) -> u32 {
        self.read_banked(self.mode(), reg)
    }

    pub fn write(&mut self, reg: usize, value: u32) {
        self.write_banked(self.mode(), reg, value);
    }

    /// Reads the User-mode register regardless of the current mode.
    #[must_use]
    pub fn read_user(&self, reg: usize) -> u32 {
        self.read_banked(Mode::User, reg)
    }

    pub fn write_user(&mut self, reg: usize, value: u32) {
        self.write_banked(Mode::User, reg, value);
    }

    #[must_use]
    pub fn read_banked(&self, mode: Mode, reg: usize) -> u32 {
        self.physical[self.map.slot(mode, reg)]
    }

    pub fn write_banked(&mut self, mode: Mode, reg: usize, value: u32) {
        let slot = self.map.slot(mode, reg);
        self.physical[slot] = value;
    }

    #[must_use]
    pub fn program_counter(&self) -> u32 {
        self.physical[REG_PROGRAM_COUNTER]
    }

    pub const fn set_program_counter(&mut self, value: u32) {
        self.physical[REG_PROGRAM_COUNTER] = value;
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        self.cpsr
    }

    pub const fn set_cpsr(&mut self, cpsr: Psr) {
        self.cpsr = cpsr;
    }

    pub const fn cpsr_mut(&mut self) -> &mut Psr {
        &mut self.cpsr
    }

    /// The SPSR of the current mode, `None` in User and System.
    #[must_use]
    pub fn spsr(&self) -> Option<Psr> {
        self.spsr_of(self.mode())
    }

    #[must_use]
    pub fn spsr_of(&self, mode: Mode) -> Option<Psr> {
        spsr_index(mode).map(|index| self.spsr[index])
    }

    /// Writes the SPSR of the current mode. Ignored in User and System.
    pub fn set_spsr(&mut self, psr: Psr) {
        let mode = self.mode();
        match spsr_index(mode) {
            Some(index) => self.spsr[index] = psr,
            None => tracing::warn!("SPSR write ignored in {mode} mode"),
        }
    }

    /// The 16 registers visible in the current mode.
    #[must_use]
    pub fn visible(&self) -> [u32; 16] {
        std::array::from_fn(|reg| self.read(reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bank_in(mode: Mode) -> RegisterBank {
        let mut bank = RegisterBank::new();
        bank.set_cpsr(Psr::from(mode));
        bank
    }

    #[test]
    fn every_slot_is_in_range_and_r0_r7_are_shared() {
        let map = BankMap::new();
        for mode in Mode::ALL {
            for reg in 0..16 {
                let slot = map.slot(mode, reg);
                assert!(slot < PHYSICAL_REGISTERS);
                assert_eq!(slot, BankMap::physical_slot(mode, reg));
                if reg < 8 || reg == REG_PROGRAM_COUNTER {
                    assert_eq!(slot, reg);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn register_16_does_not_alias_r0() {
        let bank = RegisterBank::new();
        let _ = bank.read(16);
    }

    #[test]
    fn banked_slots_are_private_to_their_mode() {
        let map = BankMap::new();
        for mode in Mode::ALL {
            for other in Mode::ALL {
                let shares_bank = mode == other
                    || matches!(
                        (mode, other),
                        (Mode::User, Mode::System) | (Mode::System, Mode::User)
                    );
                for reg in 13..=14 {
                    assert_eq!(
                        map.slot(mode, reg) == map.slot(other, reg),
                        shares_bank,
                        "{mode} vs {other} R{reg}"
                    );
                }
            }
        }
    }

    #[test]
    fn banked_stack_pointers() {
        let mut bank = bank_in(Mode::Supervisor);
        bank.write(13, 0x1000);

        bank.set_cpsr(Psr::from(Mode::Irq));
        bank.write(13, 0x2000);

        bank.set_cpsr(Psr::from(Mode::Supervisor));
        assert_eq!(bank.read(13), 0x1000);

        bank.set_cpsr(Psr::from(Mode::Irq));
        assert_eq!(bank.read(13), 0x2000);
        assert_eq!(bank.read_user(13), 0);
    }

    #[test]
    fn fiq_banks_r8_to_r14() {
        let mut bank = bank_in(Mode::User);
        for reg in 0..15 {
            bank.write(reg, reg as u32);
        }

        bank.set_cpsr(Psr::from(Mode::Fiq));
        for reg in 0..8 {
            assert_eq!(bank.read(reg), reg as u32);
        }
        for reg in 8..15 {
            assert_eq!(bank.read(reg), 0);
            bank.write(reg, 0xF1F1);
        }

        assert_eq!(bank.read_user(10), 10);
        bank.write_user(10, 99);

        bank.set_cpsr(Psr::from(Mode::System));
        assert_eq!(bank.read(10), 99);
        assert_eq!(bank.read(14), 14);
    }

    #[test]
    fn program_counter_is_shared() {
        let mut bank = bank_in(Mode::Abort);
        bank.write(REG_PROGRAM_COUNTER, 0x80);

        bank.set_cpsr(Psr::from(Mode::User));
        assert_eq!(bank.program_counter(), 0x80);
        assert_eq!(bank.read(REG_PROGRAM_COUNTER), 0x80);
    }

    #[test]
    fn spsr_access() {
        let mut bank = bank_in(Mode::User);
        assert!(!bank.current_mode_has_spsr());
        assert_eq!(bank.spsr(), None);

        bank.set_spsr(Psr::from(0xF000_0010));
        assert_eq!(bank.spsr(), None);

        bank.set_cpsr(Psr::from(Mode::Undefined));
        bank.set_spsr(Psr::from(0x6000_0010));
        assert_eq!(bank.spsr(), Some(Psr::from(0x6000_0010)));
        assert_eq!(bank.spsr_of(Mode::Abort), Some(Psr::default()));
    }

    #[test]
    fn privilege() {
        assert!(!bank_in(Mode::User).in_privileged_mode());
        assert!(bank_in(Mode::System).in_privileged_mode());
        assert!(bank_in(Mode::Fiq).in_privileged_mode());
    }
}
