//! ALU opcodes, the barrel shifter and the flag-producing adders.
//!
//! Carry is the ARM "not borrow" for subtraction: `SUB` sets C when no
//! borrow happened, i.e. when `a >= b` unsigned.

use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;
use crate::cpu::registers::register_name;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ArmModeAluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl ArmModeAluInstruction {
    /// TST, TEQ, CMP and CMN only update the flags.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// MOV and MVN ignore their first operand.
    #[must_use]
    pub const fn is_move(self) -> bool {
        matches!(self, Self::Mov | Self::Mvn)
    }
}

impl Display for ArmModeAluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

impl From<u32> for ArmModeAluInstruction {
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            _ => Mvn,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOpResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

impl ArithmeticOpResult {
    /// A logical result: N and Z from the value, C from the shifter.
    #[must_use]
    pub fn logical(result: u32, carry: bool, overflow: bool) -> Self {
        Self {
            result,
            carry,
            overflow,
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }
}

/// Shifts `rm` by an amount taken from a register (only the low byte counts).
///
/// An amount of 0 leaves both the value and the carry untouched.
#[must_use]
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    let shift_amount = shift_amount & 0xFF;
    if shift_amount == 0 {
        return ArithmeticOpResult {
            result: rm,
            carry,
            ..Default::default()
        };
    }

    let (result, carry) = match kind {
        ShiftKind::Lsl => match shift_amount {
            1..=31 => (rm << shift_amount, rm.get_bit((32 - shift_amount) as u8)),
            32 => (0, rm.get_bit(0)),
            _ => (0, false),
        },
        ShiftKind::Lsr => match shift_amount {
            1..=31 => (rm >> shift_amount, rm.get_bit((shift_amount - 1) as u8)),
            32 => (0, rm.get_bit(31)),
            _ => (0, false),
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => (
                ((rm as i32) >> shift_amount) as u32,
                rm.get_bit((shift_amount - 1) as u8),
            ),
            _ => (((rm as i32) >> 31) as u32, rm.get_bit(31)),
        },
        ShiftKind::Ror => match shift_amount & 0x1F {
            0 => (rm, rm.get_bit(31)),
            rotation => (rm.rotate_right(rotation), rm.get_bit((rotation - 1) as u8)),
        },
    };

    ArithmeticOpResult {
        result,
        carry,
        ..Default::default()
    }
}

/// Shifts `rm` by a 5-bit amount encoded in the instruction.
///
/// An encoded 0 means `LSL #0` (no shift), `LSR #32`, `ASR #32` or `RRX`.
#[must_use]
pub fn immediate_shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    match (kind, shift_amount & 0x1F) {
        (ShiftKind::Lsl, 0) => shift(kind, 0, rm, carry),
        (ShiftKind::Lsr | ShiftKind::Asr, 0) => shift(kind, 32, rm, carry),
        (ShiftKind::Ror, 0) => rrx(rm, carry),
        (_, amount) => shift(kind, amount, rm, carry),
    }
}

/// Rotate right extended: a 33-bit rotation through the carry flag.
#[must_use]
pub fn rrx(rm: u32, carry: bool) -> ArithmeticOpResult {
    ArithmeticOpResult {
        result: (u32::from(carry) << 31) | (rm >> 1),
        carry: rm.get_bit(0),
        ..Default::default()
    }
}

/// An 8-bit immediate rotated right by `rotation` (already doubled).
/// The carry out is bit 31 of the result, or `carry` when not rotated.
#[must_use]
pub fn rotated_immediate(base: u32, rotation: u32, carry: bool) -> ArithmeticOpResult {
    let result = base.rotate_right(rotation);
    ArithmeticOpResult {
        result,
        carry: if rotation == 0 { carry } else { result.get_bit(31) },
        ..Default::default()
    }
}

/// `a + b + carry_in` with every flag.
///
/// C is the carry out of bit 31, V is set when both operands have the same
/// sign and the result does not.
#[must_use]
pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> ArithmeticOpResult {
    // we do the sum in 64 bits so that bit 32 is the carry
    let wide = u64::from(a) + u64::from(b) + u64::from(carry_in);
    let result = wide as u32;

    ArithmeticOpResult {
        result,
        carry: wide >> 32 != 0,
        overflow: ((a ^ result) & (b ^ result)).get_bit(31),
        sign: result.get_bit(31),
        zero: result == 0,
    }
}

/// `a - b - !carry_in`, computed as `a + !b + carry_in`.
#[must_use]
pub fn subtract_with_carry(a: u32, b: u32, carry_in: bool) -> ArithmeticOpResult {
    add_with_carry(a, !b, carry_in)
}

/// Where a register operand's shift amount comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOperator {
    Immediate(u32),
    Register(usize),
}

/// The second operand of a data processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluSecondOperandInfo {
    Immediate {
        base: u32,
        shift: u32,
    },
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: usize,
    },
}

impl Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { base, shift } => write!(f, "#{}", base.rotate_right(*shift)),
            Self::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = register_name(*register);
                match (shift_op, shift_kind) {
                    (ShiftOperator::Immediate(0), ShiftKind::Lsl) => write!(f, "{rm}"),
                    (ShiftOperator::Immediate(0), ShiftKind::Ror) => write!(f, "{rm}, RRX"),
                    (ShiftOperator::Immediate(0), _) => write!(f, "{rm}, {shift_kind} #32"),
                    (ShiftOperator::Immediate(amount), _) => {
                        write!(f, "{rm}, {shift_kind} #{amount}")
                    }
                    (ShiftOperator::Register(rs), _) => {
                        write!(f, "{rm}, {shift_kind} {}", register_name(*rs))
                    }
                }
            }
        }
    }
}

/// Which status register a MRS/MSR addresses (R bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrKind {
    Cpsr,
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(value: bool) -> Self {
        if value { Self::Spsr } else { Self::Cpsr }
    }
}

impl Display for PsrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpsr => f.write_str("CPSR"),
            Self::Spsr => f.write_str("SPSR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsrOperand {
    Register(usize),
    Immediate { base: u32, shift: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrOpKind {
    Mrs {
        destination_register: usize,
    },
    Msr {
        /// Bits 19-16: flags, status, extension, control (msb to lsb).
        field_mask: u8,
        operand: MsrOperand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_flags() {
        let r = add_with_carry(0xFFFF_FFFF, 1, false);
        assert_eq!(r.result, 0);
        assert!(r.zero);
        assert!(r.carry);
        assert!(!r.overflow);

        let r = add_with_carry(0x7FFF_FFFF, 1, false);
        assert_eq!(r.result, 0x8000_0000);
        assert!(r.sign);
        assert!(!r.carry);
        assert!(r.overflow);
    }

    #[test]
    fn carry_in_is_chained() {
        let r = add_with_carry(0xFFFF_FFFF, 0, true);
        assert_eq!(r.result, 0);
        assert!(r.carry);
        assert!(!r.overflow);

        // The carry in alone can overflow.
        let r = add_with_carry(0x7FFF_FFFF, 0, true);
        assert_eq!(r.result, 0x8000_0000);
        assert!(r.overflow);

        // ...and can cancel an overflow of the first addition.
        let r = add_with_carry(0x8000_0000, 0xFFFF_FFFF, true);
        assert_eq!(r.result, 0x8000_0000);
        assert!(r.carry);
        assert!(!r.overflow);
    }

    #[test]
    fn subtraction_carry_is_not_borrow() {
        let r = subtract_with_carry(5, 3, true);
        assert_eq!(r.result, 2);
        assert!(r.carry);

        let r = subtract_with_carry(3, 5, true);
        assert_eq!(r.result as i32, -2);
        assert!(!r.carry);
        assert!(r.sign);

        let r = subtract_with_carry(7, 7, true);
        assert!(r.zero);
        assert!(r.carry);

        // SBC with C clear subtracts one more.
        let r = subtract_with_carry(5, 3, false);
        assert_eq!(r.result, 1);
        assert!(r.carry);

        let r = subtract_with_carry(0x8000_0000, 1, true);
        assert_eq!(r.result, 0x7FFF_FFFF);
        assert!(r.carry);
        assert!(r.overflow);
    }

    #[test]
    fn immediate_shift_special_cases() {
        let value = 0x8000_0001;

        let r = immediate_shift(ShiftKind::Lsl, 0, value, true);
        assert_eq!((r.result, r.carry), (value, true));

        let r = immediate_shift(ShiftKind::Lsr, 0, value, false);
        assert_eq!((r.result, r.carry), (0, true));

        let r = immediate_shift(ShiftKind::Asr, 0, value, false);
        assert_eq!((r.result, r.carry), (0xFFFF_FFFF, true));

        let r = immediate_shift(ShiftKind::Asr, 0, 0x7000_0000, true);
        assert_eq!((r.result, r.carry), (0, false));

        let r = immediate_shift(ShiftKind::Ror, 0, value, false);
        assert_eq!((r.result, r.carry), (0x4000_0000, true));

        let r = immediate_shift(ShiftKind::Ror, 0, 0b10, true);
        assert_eq!((r.result, r.carry), (0x8000_0001, false));
    }

    #[test]
    fn register_shift_amounts() {
        let value = 0x8000_0001;

        let r = shift(ShiftKind::Lsr, 0, value, false);
        assert_eq!((r.result, r.carry), (value, false));

        let r = shift(ShiftKind::Lsl, 1, value, false);
        assert_eq!((r.result, r.carry), (2, true));

        let r = shift(ShiftKind::Lsl, 32, value, false);
        assert_eq!((r.result, r.carry), (0, true));

        let r = shift(ShiftKind::Lsl, 33, value, true);
        assert_eq!((r.result, r.carry), (0, false));

        let r = shift(ShiftKind::Lsr, 32, value, false);
        assert_eq!((r.result, r.carry), (0, true));

        let r = shift(ShiftKind::Asr, 40, value, false);
        assert_eq!((r.result, r.carry), (0xFFFF_FFFF, true));

        let r = shift(ShiftKind::Ror, 4, 0x0000_0018, false);
        assert_eq!((r.result, r.carry), (0x8000_0001, true));

        let r = shift(ShiftKind::Ror, 32, value, false);
        assert_eq!((r.result, r.carry), (value, true));

        // Only the low byte of the register counts.
        let r = shift(ShiftKind::Lsl, 0x100, value, true);
        assert_eq!((r.result, r.carry), (value, true));
    }

    #[test]
    fn rotated_immediate_carry() {
        let r = rotated_immediate(0xFF, 0, true);
        assert_eq!((r.result, r.carry), (0xFF, true));

        let r = rotated_immediate(0x3F, 2, false);
        assert_eq!((r.result, r.carry), (0xC000_000F, true));

        let r = rotated_immediate(0x1, 8, true);
        assert_eq!((r.result, r.carry), (0x0100_0000, false));
    }

    #[test]
    fn second_operand_display() {
        let op = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Immediate(0),
            shift_kind: ShiftKind::Ror,
            register: 3,
        };
        assert_eq!(op.to_string(), "R3, RRX");

        let op = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Register(2),
            shift_kind: ShiftKind::Asr,
            register: 15,
        };
        assert_eq!(op.to_string(), "PC, ASR R2");

        let op = AluSecondOperandInfo::Immediate { base: 1, shift: 8 };
        assert_eq!(op.to_string(), "#16777216");
    }
}
