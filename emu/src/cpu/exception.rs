//! # Exceptions
//!
//! Every exception switches to a privileged mode, banks the return address
//! into that mode's LR and jumps to a fixed vector:
//!
//! ```text
//! ┌──────┬───────────────────────┬────────┬──────┬──────┬─────────┬──────────┐
//! │ Code │ Cause                 │ Vector │ Mode │ SPSR │ Disable │ LR       │
//! ├──────┼───────────────────────┼────────┼──────┼──────┼─────────┼──────────┤
//! │  1   │ Reset                 │ 0x00   │ SVC  │ no   │ I, F    │ A + 4    │
//! │  2   │ Undefined instruction │ 0x04   │ UND  │ yes  │ I       │ A + 4    │
//! │  3   │ Software interrupt    │ 0x08   │ SVC  │ yes  │ I       │ A + 4    │
//! │  4   │ Prefetch abort        │ 0x0C   │ ABT  │ yes  │ I       │ A        │
//! │  5   │ Data abort            │ 0x10   │ ABT  │ yes  │ I       │ A        │
//! │  6   │ Interrupt (IRQ)       │ 0x18   │ IRQ  │ yes  │ I       │ A + 4    │
//! │  7   │ Fast interrupt (FIQ)  │ 0x1C   │ FIQ  │ yes  │ I, F    │ A + 4    │
//! └──────┴───────────────────────┴────────┴──────┴──────┴─────────┴──────────┘
//! ```
//!
//! `A` is the address of the instruction that caused the exception. The core
//! always continues in ARM state.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cpu::arm_core::ArmCore;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::CpuState;
use crate::cpu::registers::REG_LR;
use crate::memory::{Memory, MemoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exception {
    Reset = 1,
    UndefinedInstruction = 2,
    SoftwareInterrupt = 3,
    PrefetchAbort = 4,
    DataAbort = 5,
    Interrupt = 6,
    FastInterrupt = 7,
}

impl Exception {
    /// The non-zero cause code reported by a step.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn vector(self) -> u32 {
        match self {
            Self::Reset => 0x00,
            Self::UndefinedInstruction => 0x04,
            Self::SoftwareInterrupt => 0x08,
            Self::PrefetchAbort => 0x0C,
            Self::DataAbort => 0x10,
            Self::Interrupt => 0x18,
            Self::FastInterrupt => 0x1C,
        }
    }

    #[must_use]
    pub const fn target_mode(self) -> Mode {
        match self {
            Self::Reset | Self::SoftwareInterrupt => Mode::Supervisor,
            Self::UndefinedInstruction => Mode::Undefined,
            Self::PrefetchAbort | Self::DataAbort => Mode::Abort,
            Self::Interrupt => Mode::Irq,
            Self::FastInterrupt => Mode::Fiq,
        }
    }

    #[must_use]
    pub const fn saves_spsr(self) -> bool {
        !matches!(self, Self::Reset)
    }

    #[must_use]
    pub const fn disables_fiq(self) -> bool {
        matches!(self, Self::Reset | Self::FastInterrupt)
    }

    /// Aborts return to the instruction that faulted so it can be retried.
    #[must_use]
    pub const fn returns_to_faulting_instruction(self) -> bool {
        matches!(self, Self::PrefetchAbort | Self::DataAbort)
    }

    /// Architectural priority, 1 is the highest.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Reset => 1,
            Self::DataAbort => 2,
            Self::FastInterrupt => 3,
            Self::Interrupt => 4,
            Self::PrefetchAbort => 5,
            Self::UndefinedInstruction | Self::SoftwareInterrupt => 6,
        }
    }
}

/// `a > b` when `a` is serviced before `b`.
impl Ord for Exception {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority()
            .cmp(&self.priority())
            .then_with(|| other.code().cmp(&self.code()))
    }
}

impl PartialOrd for Exception {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<u8> for Exception {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Reset),
            2 => Ok(Self::UndefinedInstruction),
            3 => Ok(Self::SoftwareInterrupt),
            4 => Ok(Self::PrefetchAbort),
            5 => Ok(Self::DataAbort),
            6 => Ok(Self::Interrupt),
            7 => Ok(Self::FastInterrupt),
            _ => Err(format!("Invalid exception code: {code}")),
        }
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reset => f.write_str("Reset"),
            Self::UndefinedInstruction => f.write_str("Undefined instruction"),
            Self::SoftwareInterrupt => f.write_str("Software interrupt"),
            Self::PrefetchAbort => f.write_str("Prefetch abort"),
            Self::DataAbort => f.write_str("Data abort"),
            Self::Interrupt => f.write_str("IRQ"),
            Self::FastInterrupt => f.write_str("FIQ"),
        }
    }
}

/// A failed load or store aborts the instruction.
impl From<MemoryError> for Exception {
    fn from(error: MemoryError) -> Self {
        tracing::debug!("data access failed: {error}");
        Self::DataAbort
    }
}

impl<M: Memory> ArmCore<M> {
    /// Takes `exception` caused by the instruction at `instruction_address`.
    ///
    /// Returns `false`, without touching any state, for an IRQ or FIQ whose
    /// disable bit is set.
    pub(crate) fn enter_exception(&mut self, exception: Exception, instruction_address: u32) -> bool {
        let old_cpsr = self.registers.cpsr();

        let masked = match exception {
            Exception::Interrupt => old_cpsr.irq_disable(),
            Exception::FastInterrupt => old_cpsr.fiq_disable(),
            _ => false,
        };
        if masked {
            tracing::debug!("{exception} suppressed, CPSR=0x{:08X}", u32::from(old_cpsr));
            return false;
        }

        let return_address = if exception.returns_to_faulting_instruction() {
            instruction_address
        } else {
            instruction_address.wrapping_add(4)
        };

        let mut cpsr = old_cpsr;
        cpsr.set_mode(exception.target_mode());
        cpsr.set_cpu_state(CpuState::Arm);
        cpsr.set_irq_disable(true);
        if exception.disables_fiq() {
            cpsr.set_fiq_disable(true);
        }
        self.registers.set_cpsr(cpsr);

        if exception.saves_spsr() {
            self.registers.set_spsr(old_cpsr);
        }

        self.registers.write(REG_LR, return_address);
        self.registers.set_program_counter(exception.vector());

        tracing::debug!(
            "{exception} taken at 0x{instruction_address:08X}, LR=0x{return_address:08X}, mode {}",
            exception.target_mode()
        );

        true
    }

    /// Signals an exception from outside the instruction stream, between two
    /// steps. The return address is the next instruction to execute.
    ///
    /// Returns whether the exception was taken: IRQ and FIQ are ignored while
    /// disabled in the CPSR.
    pub fn raise(&mut self, exception: Exception) -> bool {
        let next = self.registers.program_counter();
        let instruction_address = if exception.returns_to_faulting_instruction() {
            next
        } else {
            next.wrapping_sub(4)
        };

        self.enter_exception(exception, instruction_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::psr::Psr;
    use crate::memory::Endianness;
    use crate::memory::flat_memory::FlatMemory;
    use pretty_assertions::assert_eq;

    fn core() -> ArmCore {
        ArmCore::new(FlatMemory::new(0x100, Endianness::Little))
    }

    #[test]
    fn codes_round_trip() {
        for code in 1..=7 {
            let exception = Exception::try_from(code).unwrap();
            assert_eq!(exception.code(), code);
        }
        assert!(Exception::try_from(0).is_err());
        assert!(Exception::try_from(8).is_err());
    }

    #[test]
    fn priority_order() {
        let mut pending = vec![
            Exception::SoftwareInterrupt,
            Exception::Interrupt,
            Exception::DataAbort,
            Exception::FastInterrupt,
            Exception::PrefetchAbort,
            Exception::Reset,
        ];
        pending.sort_unstable_by(|a, b| b.cmp(a));

        assert_eq!(
            pending,
            vec![
                Exception::Reset,
                Exception::DataAbort,
                Exception::FastInterrupt,
                Exception::Interrupt,
                Exception::PrefetchAbort,
                Exception::SoftwareInterrupt,
            ]
        );
        assert!(Exception::UndefinedInstruction > Exception::SoftwareInterrupt);
    }

    #[test]
    fn data_abort_from_user_mode() {
        let mut cpu = core();
        let mut cpsr = Psr::from(Mode::User);
        cpsr.set_carry_flag(true);
        cpsr.set_sign_flag(true);
        cpu.registers.set_cpsr(cpsr);

        assert!(cpu.enter_exception(Exception::DataAbort, 0x40));

        assert_eq!(cpu.registers.mode(), Mode::Abort);
        assert_eq!(cpu.registers.spsr(), Some(cpsr));
        assert!(cpu.registers.cpsr().irq_disable());
        assert!(!cpu.registers.cpsr().fiq_disable());
        assert!(cpu.registers.cpsr().carry_flag());
        assert_eq!(cpu.registers.read(REG_LR), 0x40);
        assert_eq!(cpu.registers.program_counter(), 0x10);
        assert_eq!(cpu.registers.read_user(REG_LR), 0);
    }

    #[test]
    fn every_cause_vectors_and_banks() {
        for code in 1..=7 {
            let exception = Exception::try_from(code).unwrap();
            let mut cpu = core();
            cpu.registers.set_cpsr(Psr::from(Mode::System));

            assert!(cpu.enter_exception(exception, 0x80));

            let cpsr = cpu.registers.cpsr();
            assert_eq!(cpsr.mode(), exception.target_mode());
            assert_eq!(cpsr.cpu_state(), CpuState::Arm);
            assert!(cpsr.irq_disable());
            assert_eq!(cpsr.fiq_disable(), exception.disables_fiq());
            assert_eq!(cpu.registers.program_counter(), exception.vector());

            let expected_lr = if exception.returns_to_faulting_instruction() {
                0x80
            } else {
                0x84
            };
            assert_eq!(cpu.registers.read(REG_LR), expected_lr, "{exception}");

            let expected_spsr = if exception.saves_spsr() {
                Psr::from(Mode::System)
            } else {
                Psr::default()
            };
            assert_eq!(cpu.registers.spsr(), Some(expected_spsr), "{exception}");
        }
    }

    #[test]
    fn thumb_state_is_left_on_entry() {
        let mut cpu = core();
        let mut cpsr = Psr::from(Mode::User);
        cpsr.set_cpu_state(CpuState::Thumb);
        cpu.registers.set_cpsr(cpsr);

        cpu.enter_exception(Exception::UndefinedInstruction, 0);

        assert_eq!(cpu.registers.cpsr().cpu_state(), CpuState::Arm);
        assert_eq!(
            cpu.registers.spsr().map(Psr::cpu_state),
            Some(CpuState::Thumb)
        );
    }

    #[test]
    fn masked_interrupts_are_ignored() {
        let mut cpu = core();
        let mut cpsr = Psr::from(Mode::User);
        cpsr.set_irq_disable(true);
        cpsr.set_fiq_disable(true);
        cpu.registers.set_cpsr(cpsr);
        cpu.registers.set_program_counter(0x20);

        assert!(!cpu.raise(Exception::Interrupt));
        assert!(!cpu.raise(Exception::FastInterrupt));
        assert_eq!(cpu.registers.cpsr(), cpsr);
        assert_eq!(cpu.registers.program_counter(), 0x20);

        // Reset cannot be masked.
        assert!(cpu.raise(Exception::Reset));
        assert_eq!(cpu.registers.mode(), Mode::Supervisor);
        assert_eq!(cpu.registers.program_counter(), 0);
    }

    #[test]
    fn raised_interrupt_returns_to_next_instruction() {
        let mut cpu = core();
        cpu.registers.set_program_counter(0x24);

        assert!(cpu.raise(Exception::Interrupt));
        assert_eq!(cpu.registers.mode(), Mode::Irq);
        assert_eq!(cpu.registers.read(REG_LR), 0x24);
        assert_eq!(cpu.registers.program_counter(), 0x18);

        // Now in IRQ with I set: a second IRQ is held off, a FIQ is not.
        assert!(!cpu.raise(Exception::Interrupt));
        assert!(cpu.raise(Exception::FastInterrupt));
        assert_eq!(cpu.registers.mode(), Mode::Fiq);
        assert_eq!(cpu.registers.read(REG_LR), 0x18);
        assert_eq!(cpu.registers.spsr().map(Psr::mode), Some(Mode::Irq));
    }

    #[test]
    fn names() {
        assert_eq!(Exception::DataAbort.to_string(), "Data abort");
        assert_eq!(Exception::FastInterrupt.to_string(), "FIQ");
    }
}
