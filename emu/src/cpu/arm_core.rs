//! # The ARM Core
//!
//! [`ArmCore`] ties the register file, the condition table and a [`Memory`]
//! together and executes one instruction per [`ArmCore::step`]:
//!
//! ```text
//!   fetch ──fault──▶ Prefetch abort
//!     │
//!   PC += 4
//!     │
//!   cond == NV ──▶ Undefined instruction
//!     │
//!   cond fails ──▶ skip
//!     │
//!   SWI 0x123456 ──▶ Halted
//!     │
//!   execute ──Err(cause)──▶ enter exception
//! ```
//!
//! While the instruction at address `A` executes, R15 holds `A + 4`; operand
//! reads of R15 see `A + 8`, the value a three-stage pipeline would expose.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::arm::mode::ArmModeOpcode;
use crate::cpu::condition::{Condition, ConditionTable};
use crate::cpu::cpu_modes::Mode;
use crate::cpu::exception::Exception;
use crate::cpu::register_bank::RegisterBank;
use crate::cpu::registers::REG_PROGRAM_COUNTER;
use crate::memory::flat_memory::FlatMemory;
use crate::memory::{Endianness, Memory};

pub const SIZE_OF_ARM_INSTRUCTION: u32 = 4;

/// Comment field of the SWI that ends the simulation.
pub const HALT_COMMENT: u32 = 0x12_3456;

/// Memory size of [`ArmCore::default`].
pub const DEFAULT_MEMORY_SIZE: u32 = 0x1_0000;

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Executed,
    /// The exception has already been entered: PC is at its vector.
    Exception(Exception),
    Halted,
}

impl StepResult {
    /// 0 when no exception was taken, the exception code otherwise.
    #[must_use]
    pub const fn cause_code(self) -> u8 {
        match self {
            Self::Executed | Self::Halted => 0,
            Self::Exception(exception) => exception.code(),
        }
    }
}

/// Architectural state, for inspection and dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub registers: [u32; 16],
    pub cpsr: u32,
    pub spsr: Option<u32>,
    pub mode: Mode,
}

pub struct ArmCore<M: Memory = FlatMemory> {
    pub registers: RegisterBank,
    memory: M,
    conditions: ConditionTable,
}

impl Default for ArmCore<FlatMemory> {
    fn default() -> Self {
        Self::new(FlatMemory::new(DEFAULT_MEMORY_SIZE, Endianness::Little))
    }
}

impl<M: Memory> ArmCore<M> {
    /// A core in User mode, ARM state, with every register cleared.
    pub fn new(memory: M) -> Self {
        Self {
            registers: RegisterBank::new(),
            memory,
            conditions: ConditionTable::new(),
        }
    }

    pub const fn memory(&self) -> &M {
        &self.memory
    }

    pub const fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Reads `reg` as an instruction operand: R15 reads 8 bytes past the
    /// executing instruction.
    pub(crate) fn read_operand(&self, reg: usize) -> u32 {
        let value = self.registers.read(reg);
        if reg == REG_PROGRAM_COUNTER {
            value.wrapping_add(SIZE_OF_ARM_INSTRUCTION)
        } else {
            value
        }
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> StepResult {
        // ARM instructions are word aligned.
        let mut pc = self.registers.program_counter();
        pc.set_bit_off(0);
        pc.set_bit_off(1);
        let instruction_address = pc;

        let op_code = match self.memory.read_word(instruction_address) {
            Ok(raw) => ArmModeOpcode::from(raw),
            Err(error) => {
                tracing::debug!("instruction fetch failed: {error}");
                return self.take_exception(Exception::PrefetchAbort, instruction_address);
            }
        };

        self.registers
            .set_program_counter(instruction_address.wrapping_add(SIZE_OF_ARM_INSTRUCTION));

        tracing::trace!(
            "0x{instruction_address:08X}: {:08X}  {}",
            op_code.raw,
            op_code.disassembler()
        );

        if op_code.condition == Condition::NV {
            return self.take_exception(Exception::UndefinedInstruction, instruction_address);
        }

        if !self
            .conditions
            .passes(op_code.condition, self.registers.cpsr().flags())
        {
            tracing::trace!("condition {} failed, skipped", op_code.condition);
            return StepResult::Executed;
        }

        if let ArmModeInstruction::SoftwareInterrupt {
            comment: HALT_COMMENT,
        } = op_code.instruction
        {
            tracing::debug!("halt requested at 0x{instruction_address:08X}");
            return StepResult::Halted;
        }

        match self.execute(op_code.instruction) {
            Ok(()) => StepResult::Executed,
            Err(exception) => self.take_exception(exception, instruction_address),
        }
    }

    fn take_exception(&mut self, exception: Exception, instruction_address: u32) -> StepResult {
        self.enter_exception(exception, instruction_address);
        StepResult::Exception(exception)
    }

    fn execute(&mut self, instruction: ArmModeInstruction) -> Result<(), Exception> {
        use ArmModeInstruction::{
            BlockDataTransfer, Branch, BranchAndExchange, CountLeadingZeros, DataProcessing,
            HalfwordDataTransfer, Multiply, MultiplyLong, PsrTransfer, SingleDataTransfer,
            SoftwareInterrupt, Undefined,
        };

        match instruction {
            DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            Multiply {
                accumulate,
                set_conditions,
                rd,
                rn,
                rs,
                rm,
            } => self.mul_or_mla(set_conditions, accumulate, rd, rn, rs, rm),
            MultiplyLong {
                variant,
                set_conditions,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => self.multiply_long(variant, set_conditions, rd_hi, rd_lo, rs, rm),
            CountLeadingZeros { rd, rm } => self.count_leading_zeros(rd, rm),
            BranchAndExchange { link, register } => self.branch_and_exchange(link, register),
            PsrTransfer { psr_kind, kind } => self.psr_transfer(psr_kind, kind),
            SingleDataTransfer {
                load_store,
                quantity,
                indexing,
                offsetting,
                write_back,
                rd,
                base_register,
                offset_info,
            } => {
                return self.single_data_transfer(
                    load_store,
                    quantity,
                    indexing,
                    offsetting,
                    write_back,
                    rd,
                    base_register,
                    offset_info,
                );
            }
            HalfwordDataTransfer {
                transfer_kind,
                indexing,
                offsetting,
                write_back,
                rd,
                base_register,
                offset_kind,
            } => {
                return self.half_word_data_transfer(
                    transfer_kind,
                    indexing,
                    offsetting,
                    write_back,
                    rd,
                    base_register,
                    offset_kind,
                );
            }
            BlockDataTransfer {
                indexing,
                offsetting,
                load_psr,
                write_back,
                load_store,
                rn,
                register_list,
            } => {
                return self.block_data_transfer(
                    indexing,
                    offsetting,
                    load_psr,
                    write_back,
                    load_store,
                    rn,
                    register_list,
                );
            }
            Branch { link, offset } => self.branch(link, offset),
            SoftwareInterrupt { .. } => return Err(Exception::SoftwareInterrupt),
            Undefined => return Err(Exception::UndefinedInstruction),
        }

        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.registers.visible(),
            cpsr: self.registers.cpsr().into(),
            spsr: self.registers.spsr().map(u32::from),
            mode: self.registers.mode(),
        }
    }
}

#[cfg(test)]
impl ArmCore<FlatMemory> {
    /// Writes `op_code` at PC and steps over it.
    pub(crate) fn run_instruction(&mut self, op_code: u32) -> StepResult {
        let pc = self.registers.program_counter();
        self.memory_mut().write_word(pc, op_code).unwrap();
        self.step()
    }

    pub(crate) fn with_program(program: &[u32]) -> Self {
        let mut cpu = Self::default();
        cpu.memory_mut().load_words(0, program).unwrap();
        cpu
    }
}
