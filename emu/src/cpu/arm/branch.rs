use crate::bitwise::Bits;
use crate::cpu::arm_core::ArmCore;
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};
use crate::memory::Memory;

impl<M: Memory> ArmCore<M> {
    /// B and BL. The offset is relative to the instruction address + 8.
    pub(crate) fn branch(&mut self, link: bool, offset: i32) {
        if link {
            let return_address = self.registers.program_counter();
            self.registers.write(REG_LR, return_address);
        }

        let target = self
            .read_operand(REG_PROGRAM_COUNTER)
            .wrapping_add_signed(offset);
        self.registers.set_program_counter(target);
    }

    /// BX and BLX (register).
    pub(crate) fn branch_and_exchange(&mut self, link: bool, register: usize) {
        let target = self.read_operand(register);
        if link {
            let return_address = self.registers.program_counter();
            self.registers.write(REG_LR, return_address);
        }

        self.jump_interworking(target);
    }

    /// Jumps to `target`, entering Thumb state when bit 0 is set.
    pub(crate) fn jump_interworking(&mut self, target: u32) {
        self.registers
            .cpsr_mut()
            .set_cpu_state(target.get_bit(0).into());

        let mut pc = target;
        pc.set_bit_off(0);
        self.registers.set_program_counter(pc);
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm_core::{ArmCore, StepResult};
    use crate::cpu::psr::CpuState;
    use crate::cpu::registers::REG_LR;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_branch_forward_and_back() {
        let mut cpu = ArmCore::default();
        cpu.registers.set_program_counter(0x100);

        // B .+0x20
        cpu.run_instruction(0xEA00_0006);
        assert_eq!(cpu.registers.program_counter(), 0x120);

        // B .-0x20
        cpu.run_instruction(0xEAFF_FFF6);
        assert_eq!(cpu.registers.program_counter(), 0x100);
        assert_eq!(cpu.registers.read(REG_LR), 0);
    }

    #[test]
    fn check_branch_with_link() {
        let mut cpu = ArmCore::default();
        cpu.registers.set_program_counter(0x200);

        // BL .+0x100
        cpu.run_instruction(0xEB00_003E);
        assert_eq!(cpu.registers.program_counter(), 0x300);
        assert_eq!(cpu.registers.read(REG_LR), 0x204);

        // MOV PC, LR
        cpu.run_instruction(0xE1A0_F00E);
        assert_eq!(cpu.registers.program_counter(), 0x204);
    }

    #[test]
    fn branch_to_self() {
        let mut cpu = ArmCore::default();
        cpu.registers.set_program_counter(0x40);

        // B .
        for _ in 0..3 {
            assert_eq!(cpu.run_instruction(0xEAFF_FFFE), StepResult::Executed);
            assert_eq!(cpu.registers.program_counter(), 0x40);
        }
    }

    #[test]
    fn check_bx_and_blx() {
        let mut cpu = ArmCore::default();
        cpu.registers.set_program_counter(0x100);
        cpu.registers.write(3, 0x801);

        // BX R3
        cpu.run_instruction(0xE12F_FF13);
        assert_eq!(cpu.registers.program_counter(), 0x800);
        assert_eq!(cpu.registers.cpsr().cpu_state(), CpuState::Thumb);

        // BLX LR returns to the old LR and links the new one.
        cpu.registers.set_program_counter(0x500);
        cpu.registers.write(REG_LR, 0x600);
        cpu.run_instruction(0xE12F_FF3E);
        assert_eq!(cpu.registers.program_counter(), 0x600);
        assert_eq!(cpu.registers.read(REG_LR), 0x504);
        assert_eq!(cpu.registers.cpsr().cpu_state(), CpuState::Arm);
    }
}
