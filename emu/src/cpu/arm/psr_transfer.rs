use crate::cpu::arm::alu_instruction::{MsrOperand, PsrKind, PsrOpKind};
use crate::cpu::arm_core::ArmCore;
use crate::memory::Memory;

/// Only the flags byte of the CPSR can be written from User mode.
const USER_WRITABLE_FIELDS: u8 = 0b1000;

impl<M: Memory> ArmCore<M> {
    /// MRS and MSR.
    pub(crate) fn psr_transfer(&mut self, psr_kind: PsrKind, kind: PsrOpKind) {
        match kind {
            PsrOpKind::Mrs {
                destination_register,
            } => {
                let psr = match psr_kind {
                    PsrKind::Cpsr => Some(self.registers.cpsr()),
                    PsrKind::Spsr => self.registers.spsr(),
                };

                match psr {
                    Some(psr) => self.registers.write(destination_register, psr.into()),
                    None => tracing::warn!(
                        "MRS from SPSR in {} mode ignored",
                        self.registers.mode()
                    ),
                }
            }
            PsrOpKind::Msr {
                field_mask,
                operand,
            } => {
                let value = match operand {
                    MsrOperand::Register(rm) => self.read_operand(rm),
                    MsrOperand::Immediate { base, shift } => base.rotate_right(shift),
                };

                match psr_kind {
                    PsrKind::Cpsr => {
                        let field_mask = if self.registers.in_privileged_mode() {
                            field_mask
                        } else {
                            field_mask & USER_WRITABLE_FIELDS
                        };

                        let mut cpsr = self.registers.cpsr();
                        cpsr.write_fields(value, field_mask);
                        self.registers.set_cpsr(cpsr);
                    }
                    PsrKind::Spsr => match self.registers.spsr() {
                        Some(mut spsr) => {
                            spsr.write_fields(value, field_mask);
                            self.registers.set_spsr(spsr);
                        }
                        None => tracing::warn!(
                            "MSR to SPSR in {} mode ignored",
                            self.registers.mode()
                        ),
                    },
                }
            }
        }
    }
}
