//! # Program Status Registers (CPSR and SPSR)
//!
//! ```text
//! 31 30 29 28 27      8 7 6 5 4   0
//! ┌──┬──┬──┬──┬────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │Reserved│I│F│T│Mode │
//! └──┴──┴──┴──┴────────┴─┴─┴─┴─────┘
//! ```
//!
//! - **Flags (28-31)**: tested by the [`condition`](super::condition) table
//! - **I/F bits (7, 6)**: IRQ/FIQ disable
//! - **T bit (5)**: ARM (0) or Thumb (1) state
//! - **Mode (0-4)**: see [`cpu_modes`](super::cpu_modes)
//!
//! MSR addresses the register one byte at a time: control (`c`, bits 0-7),
//! extension (`x`, 8-15), status (`s`, 16-23) and flags (`f`, 24-31).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArithmeticOpResult;
use crate::cpu::cpu_modes::Mode;

/// Program Status Register (CPSR or SPSR).
///
/// ```
/// use emu::cpu::psr::Psr;
///
/// let mut cpsr = Psr::default();
/// cpsr.set_zero_flag(true);
/// cpsr.set_carry_flag(true);
/// assert_eq!(cpsr.flags(), 0b0110);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// The NZCV nibble, N in bit 3 down to V in bit 0.
    #[must_use]
    pub fn flags(self) -> u8 {
        self.0.get_bits(28..=31) as u8
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    /// M4-M0 => Bits 4-0
    ///
    /// A saved PSR may hold mode bits that name no mode (an SPSR written
    /// with garbage). Supervisor is returned in that case.
    #[must_use]
    pub fn mode(self) -> Mode {
        let mode_bits = self.0.get_bits(0..=4);
        Mode::try_from(mode_bits).unwrap_or_else(|_| {
            tracing::debug!(
                "invalid mode bits 0b{mode_bits:05b} in PSR=0x{:08X}, defaulting to Supervisor",
                self.0
            );
            Mode::Supervisor
        })
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    pub fn set_flags(&mut self, op_result: &ArithmeticOpResult) {
        self.set_sign_flag(op_result.sign);
        self.set_zero_flag(op_result.zero);
        self.set_carry_flag(op_result.carry);
        self.set_overflow_flag(op_result.overflow);
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(6, value);
    }

    pub fn set_state_bit(&mut self, value: bool) {
        self.0.set_bit(5, value);
    }

    /// The Mode Bits M4-M0 contain the current operating mode.
    pub fn set_mode(&mut self, m: Mode) {
        self.0.set_bits(0..=4, m.into());
    }

    /// Copies byte `i` of `value` into byte `i` of the register for every
    /// bit `i` set in `field_mask` (c, x, s, f from bit 0 up).
    pub fn write_fields(&mut self, value: u32, field_mask: u8) {
        for byte in 0..4 {
            if field_mask.get_bit(byte) {
                self.0.set_byte(byte, value.get_byte(byte));
            }
        }
    }

    #[must_use]
    pub fn cpu_state(self) -> CpuState {
        self.state_bit().into()
    }

    pub fn set_cpu_state(&mut self, state: CpuState) {
        self.set_state_bit(state.into());
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        let mut s = Self(0);
        s.set_mode(m);
        s
    }
}

impl From<u32> for Psr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

/// The CPU execution state, selected by the T bit.
///
/// Only ARM code is decoded; the T bit is still tracked so that
/// interworking branches and loads leave the expected state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Thumb,
    Arm,
}

impl From<CpuState> for bool {
    fn from(state: CpuState) -> Self {
        match state {
            CpuState::Arm => false,
            CpuState::Thumb => true,
        }
    }
}

impl From<bool> for CpuState {
    fn from(state: bool) -> Self {
        if state { Self::Thumb } else { Self::Arm }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_flags() {
        let mut cpsr = Psr(0);
        cpsr.set_sign_flag(true);
        assert!(cpsr.sign_flag());
        assert_eq!(u32::from(cpsr), 0x8000_0000);

        cpsr.set_overflow_flag(true);
        assert!(cpsr.overflow_flag());
        assert_eq!(cpsr.flags(), 0b1001);

        cpsr.set_flags(&ArithmeticOpResult {
            result: 0,
            carry: true,
            overflow: false,
            sign: false,
            zero: true,
        });
        assert_eq!(cpsr.flags(), 0b0110);
    }

    #[test]
    fn check_control_bits() {
        let mut cpsr = Psr(0);
        cpsr.set_irq_disable(true);
        cpsr.set_fiq_disable(true);
        cpsr.set_state_bit(true);

        assert!(cpsr.irq_disable());
        assert!(cpsr.fiq_disable());
        assert_eq!(cpsr.cpu_state(), CpuState::Thumb);
        assert_eq!(u32::from(cpsr), 0b1110_0000);

        cpsr.set_cpu_state(CpuState::Arm);
        assert!(!cpsr.state_bit());
    }

    #[test]
    fn check_modes() {
        for mode in Mode::ALL {
            let mut cpsr = Psr(0xF000_00C0);
            cpsr.set_mode(mode);

            assert_eq!(cpsr.mode(), mode);
            assert_eq!(u32::from(cpsr) & 0b11111, u32::from(mode));
            assert_eq!(u32::from(cpsr) & !0b11111, 0xF000_00C0);
        }
    }

    #[test]
    fn invalid_mode_bits_fall_back_to_supervisor() {
        assert_eq!(Psr(0).mode(), Mode::Supervisor);
    }

    #[test]
    fn write_selected_fields() {
        let mut psr = Psr::from(Mode::Supervisor);

        psr.write_fields(0xA000_0000, 0b1000);
        assert_eq!(u32::from(psr), 0xA000_0013);

        psr.write_fields(0x1234_56D2, 0b0001);
        assert_eq!(u32::from(psr), 0xA000_00D2);
        assert_eq!(psr.mode(), Mode::Irq);

        psr.write_fields(0xFFFF_FFFF, 0b0000);
        assert_eq!(u32::from(psr), 0xA000_00D2);
    }
}
