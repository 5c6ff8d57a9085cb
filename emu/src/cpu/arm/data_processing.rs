use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, ArithmeticOpResult, ArmModeAluInstruction, ShiftOperator,
    add_with_carry, immediate_shift, rotated_immediate, shift, subtract_with_carry,
};
use crate::cpu::arm::instructions::ArmModeMultiplyLongVariant;
use crate::cpu::arm_core::ArmCore;
use crate::cpu::registers::REG_PROGRAM_COUNTER;
use crate::memory::Memory;

impl<M: Memory> ArmCore<M> {
    /// Runs the barrel shifter. `result` is operand 2, `carry` the shifter
    /// carry out.
    pub(crate) fn shifter_operand(&self, op2: AluSecondOperandInfo) -> ArithmeticOpResult {
        let carry = self.registers.cpsr().carry_flag();
        match op2 {
            AluSecondOperandInfo::Immediate { base, shift } => {
                rotated_immediate(base, shift, carry)
            }
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = self.read_operand(register);
                match shift_op {
                    ShiftOperator::Immediate(amount) => {
                        immediate_shift(shift_kind, amount, rm, carry)
                    }
                    ShiftOperator::Register(rs) => {
                        shift(shift_kind, self.read_operand(rs), rm, carry)
                    }
                }
            }
        }
    }

    pub(crate) fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    ) {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };

        let shifter = self.shifter_operand(op2);
        let op1 = self.read_operand(rn);
        let op2 = shifter.result;

        let cpsr = self.registers.cpsr();
        let logical =
            |result: u32| ArithmeticOpResult::logical(result, shifter.carry, cpsr.overflow_flag());

        let result = match alu_instruction {
            And | Tst => logical(op1 & op2),
            Eor | Teq => logical(op1 ^ op2),
            Sub | Cmp => subtract_with_carry(op1, op2, true),
            Rsb => subtract_with_carry(op2, op1, true),
            Add | Cmn => add_with_carry(op1, op2, false),
            Adc => add_with_carry(op1, op2, cpsr.carry_flag()),
            Sbc => subtract_with_carry(op1, op2, cpsr.carry_flag()),
            Rsc => subtract_with_carry(op2, op1, cpsr.carry_flag()),
            Orr => logical(op1 | op2),
            Mov => logical(op2),
            Bic => logical(op1 & !op2),
            Mvn => logical(!op2),
        };

        if !alu_instruction.is_test() {
            self.registers.write(destination, result.result);
        }

        if !set_conditions {
            return;
        }

        // Writing PC with S set returns from an exception handler.
        if destination == REG_PROGRAM_COUNTER && !alu_instruction.is_test() {
            if let Some(spsr) = self.registers.spsr() {
                self.registers.set_cpsr(spsr);
                return;
            }
        }

        self.registers.cpsr_mut().set_flags(&result);
    }

    pub(crate) fn mul_or_mla(
        &mut self,
        set_conditions: bool,
        accumulate: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    ) {
        let mut result = self.registers.read(rm).wrapping_mul(self.registers.read(rs));
        if accumulate {
            result = result.wrapping_add(self.registers.read(rn));
        }

        self.registers.write(rd, result);

        if set_conditions {
            let cpsr = self.registers.cpsr_mut();
            cpsr.set_zero_flag(result == 0);
            cpsr.set_sign_flag(result >> 31 == 1);
        }
    }

    pub(crate) fn multiply_long(
        &mut self,
        variant: ArmModeMultiplyLongVariant,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    ) {
        let rm_value = self.registers.read(rm);
        let rs_value = self.registers.read(rs);

        let mut result = if variant.is_signed() {
            i64::from(rm_value as i32).wrapping_mul(i64::from(rs_value as i32)) as u64
        } else {
            u64::from(rm_value).wrapping_mul(u64::from(rs_value))
        };

        if variant.accumulates() {
            let accumulator =
                (u64::from(self.registers.read(rd_hi)) << 32) | u64::from(self.registers.read(rd_lo));
            result = result.wrapping_add(accumulator);
        }

        self.registers.write(rd_lo, result as u32);
        self.registers.write(rd_hi, (result >> 32) as u32);

        if set_conditions {
            let cpsr = self.registers.cpsr_mut();
            cpsr.set_zero_flag(result == 0);
            cpsr.set_sign_flag(result >> 63 == 1);
        }
    }

    pub(crate) fn count_leading_zeros(&mut self, rd: usize, rm: usize) {
        let value = self.registers.read(rm);
        self.registers.write(rd, value.leading_zeros());
    }
}
