//! # ARM Instruction Decoding
//!
//! Decoding is a pure function of the 32-bit word. Bits 27-25 select the
//! instruction class, a few more bits disambiguate inside a class:
//!
//! ```text
//! ┌───────┬──────────────────────────────────────────────────────────────┐
//! │ 27-25 │ Class                                                        │
//! ├───────┼──────────────────────────────────────────────────────────────┤
//! │  000  │ bit7 & bit4:  SH=00 multiply, else LDRH/STRH/LDRSB/LDRSH/    │
//! │       │               LDRD/STRD                                      │
//! │       │ 24-23=10, S=0: MRS, MSR (register), BX, BLX, CLZ             │
//! │       │ otherwise:    data processing, register operand              │
//! │  001  │ 24-23=10, S=0: MSR (immediate) or undefined                  │
//! │       │ otherwise:    data processing, immediate operand             │
//! │  010  │ LDR/STR, immediate offset                                    │
//! │  011  │ LDR/STR, register offset (bit4 set: undefined)               │
//! │  100  │ LDM/STM                                                      │
//! │  101  │ B/BL                                                         │
//! │  110  │ coprocessor load/store (undefined)                           │
//! │  111  │ bit24: SWI, otherwise coprocessor (undefined)                │
//! └───────┴──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Instruction Encoding Example
//!
//! ```text
//! ADD R0, R1, R2, LSL #3
//!
//! 31-28  27-26  25  24-21  20  19-16  15-12  11-7   6-5  4  3-0
//! [1110] [ 00 ] [0] [0100] [0] [0001] [0000] [00011][00] [0][0010]
//!   │              │    │     │    │      │      │     │   │   └─ Rm = R2
//!   │              │    │     │    │      │      │     │   └──── Shift by imm
//!   │              │    │     │    │      │      │     └──────── LSL
//!   │              │    │     │    │      │      └────────────── Shift = 3
//!   │              │    │     │    │      └───────────────────── Rd = R0
//!   │              │    │     │    └──────────────────────────── Rn = R1
//!   │              │    │     └───────────────────────────────── S = 0
//!   │              │    └─────────────────────────────────────── ADD opcode
//!   │              └──────────────────────────────────────────── Register operand
//!   └─────────────────────────────────────────────────────────── Always execute
//! ```

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, ArmModeAluInstruction, MsrOperand, PsrKind, PsrOpKind, ShiftOperator,
};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{
    Indexing, LoadStoreKind, Offsetting, OperandKind, ReadWriteKind, ShiftKind,
};
use crate::cpu::registers::register_name;

/// Offset of a word/byte load or store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SingleDataTransferOffsetInfo {
    Immediate {
        offset: u32,
    },
    /// A register, optionally scaled by an immediate shift.
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        reg_offset: usize,
    },
}

/// Offset of a halfword, signed byte or doubleword transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HalfwordDataTransferOffsetKind {
    Immediate { offset: u32 },
    Register { register: usize },
}

/// The L, S and H bits of the extra load/store encodings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HalfwordTransferKind {
    Strh,
    Ldrd,
    Strd,
    Ldrh,
    Ldrsb,
    Ldrsh,
}

impl HalfwordTransferKind {
    fn decode(load: bool, sh_bits: u32) -> Option<Self> {
        match (load, sh_bits) {
            (false, 0b01) => Some(Self::Strh),
            (false, 0b10) => Some(Self::Ldrd),
            (false, 0b11) => Some(Self::Strd),
            (true, 0b01) => Some(Self::Ldrh),
            (true, 0b10) => Some(Self::Ldrsb),
            (true, 0b11) => Some(Self::Ldrsh),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_doubleword(self) -> bool {
        matches!(self, Self::Ldrd | Self::Strd)
    }
}

impl std::fmt::Display for HalfwordTransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strh => f.write_str("STRH"),
            Self::Ldrd => f.write_str("LDRD"),
            Self::Strd => f.write_str("STRD"),
            Self::Ldrh => f.write_str("LDRH"),
            Self::Ldrsb => f.write_str("LDRSB"),
            Self::Ldrsh => f.write_str("LDRSH"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArmModeMultiplyLongVariant {
    Umull,
    Umlal,
    Smull,
    Smlal,
}

impl ArmModeMultiplyLongVariant {
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Smull | Self::Smlal)
    }

    #[must_use]
    pub const fn accumulates(self) -> bool {
        matches!(self, Self::Umlal | Self::Smlal)
    }
}

impl From<u32> for ArmModeMultiplyLongVariant {
    fn from(op_code: u32) -> Self {
        match (op_code.get_bit(22), op_code.get_bit(21)) {
            (false, false) => Self::Umull,
            (false, true) => Self::Umlal,
            (true, false) => Self::Smull,
            (true, true) => Self::Smlal,
        }
    }
}

impl std::fmt::Display for ArmModeMultiplyLongVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Umull => f.write_str("UMULL"),
            Self::Umlal => f.write_str("UMLAL"),
            Self::Smull => f.write_str("SMULL"),
            Self::Smlal => f.write_str("SMLAL"),
        }
    }
}

/// All ARM instruction kinds after decoding. The condition field lives in
/// [`ArmModeOpcode`](super::mode::ArmModeOpcode).
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ArmModeInstruction {
    /// ALU operations (AND, ADD, CMP, MOV, ...)
    DataProcessing {
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    },
    /// MUL and MLA
    Multiply {
        accumulate: bool,
        set_conditions: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    },
    /// UMULL, UMLAL, SMULL and SMLAL
    MultiplyLong {
        variant: ArmModeMultiplyLongVariant,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    },
    CountLeadingZeros {
        rd: usize,
        rm: usize,
    },
    /// BX, or BLX when `link` is set
    BranchAndExchange {
        link: bool,
        register: usize,
    },
    PsrTransfer {
        psr_kind: PsrKind,
        kind: PsrOpKind,
    },
    SingleDataTransfer {
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
    },
    HalfwordDataTransfer {
        transfer_kind: HalfwordTransferKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rd: usize,
        base_register: usize,
        offset_kind: HalfwordDataTransferOffsetKind,
    },
    BlockDataTransfer {
        indexing: Indexing,
        offsetting: Offsetting,
        /// S bit: user bank transfer, or CPSR restore when R15 is loaded.
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: usize,
        register_list: u16,
    },
    /// B and BL. `offset` is already sign-extended and scaled to bytes.
    Branch {
        link: bool,
        offset: i32,
    },
    SoftwareInterrupt {
        comment: u32,
    },
    Undefined,
}

impl ArmModeInstruction {
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn disassembler(&self, condition: Condition) -> String {
        match self {
            Self::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => {
                let s = if *set_conditions { "S" } else { "" };
                let rd = register_name(*destination);
                let rn = register_name(*rn);
                if alu_instruction.is_test() {
                    format!("{alu_instruction}{condition} {rn}, {op2}")
                } else if alu_instruction.is_move() {
                    format!("{alu_instruction}{condition}{s} {rd}, {op2}")
                } else {
                    format!("{alu_instruction}{condition}{s} {rd}, {rn}, {op2}")
                }
            }
            Self::Multiply {
                accumulate,
                set_conditions,
                rd,
                rn,
                rs,
                rm,
            } => {
                let s = if *set_conditions { "S" } else { "" };
                let (rd, rm, rs) = (register_name(*rd), register_name(*rm), register_name(*rs));
                if *accumulate {
                    format!("MLA{condition}{s} {rd}, {rm}, {rs}, {}", register_name(*rn))
                } else {
                    format!("MUL{condition}{s} {rd}, {rm}, {rs}")
                }
            }
            Self::MultiplyLong {
                variant,
                set_conditions,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => {
                let s = if *set_conditions { "S" } else { "" };
                format!(
                    "{variant}{condition}{s} {}, {}, {}, {}",
                    register_name(*rd_lo),
                    register_name(*rd_hi),
                    register_name(*rm),
                    register_name(*rs)
                )
            }
            Self::CountLeadingZeros { rd, rm } => {
                format!("CLZ{condition} {}, {}", register_name(*rd), register_name(*rm))
            }
            Self::BranchAndExchange { link, register } => {
                let l = if *link { "L" } else { "" };
                format!("B{l}X{condition} {}", register_name(*register))
            }
            Self::PsrTransfer { psr_kind, kind } => match kind {
                PsrOpKind::Mrs {
                    destination_register,
                } => format!(
                    "MRS{condition} {}, {psr_kind}",
                    register_name(*destination_register)
                ),
                PsrOpKind::Msr {
                    field_mask,
                    operand,
                } => {
                    let fields: String = [(3, 'f'), (2, 's'), (1, 'x'), (0, 'c')]
                        .into_iter()
                        .filter(|(bit, _)| field_mask.get_bit(*bit))
                        .map(|(_, name)| name)
                        .collect();
                    let operand = match operand {
                        MsrOperand::Register(rm) => register_name(*rm).to_string(),
                        MsrOperand::Immediate { base, shift } => {
                            format!("#0x{:X}", base.rotate_right(*shift))
                        }
                    };
                    format!("MSR{condition} {psr_kind}_{fields}, {operand}")
                }
            },
            Self::SingleDataTransfer {
                load_store,
                quantity,
                indexing,
                offsetting,
                write_back,
                rd,
                base_register,
                offset_info,
            } => {
                let b = match quantity {
                    ReadWriteKind::Word => "",
                    ReadWriteKind::Byte => "B",
                };
                let sign = match offsetting {
                    Offsetting::Up => "",
                    Offsetting::Down => "-",
                };
                let offset = match offset_info {
                    SingleDataTransferOffsetInfo::Immediate { offset: 0 } => String::new(),
                    SingleDataTransferOffsetInfo::Immediate { offset } => {
                        format!(", #{sign}{offset}")
                    }
                    SingleDataTransferOffsetInfo::RegisterImmediate {
                        shift_amount,
                        shift_kind,
                        reg_offset,
                    } => {
                        let op2 = AluSecondOperandInfo::Register {
                            shift_op: ShiftOperator::Immediate(*shift_amount),
                            shift_kind: *shift_kind,
                            register: *reg_offset,
                        };
                        format!(", {sign}{op2}")
                    }
                };
                let address = format_address(*base_register, &offset, *indexing, *write_back);

                format!("{load_store}{condition}{b} {}, {address}", register_name(*rd))
            }
            Self::HalfwordDataTransfer {
                transfer_kind,
                indexing,
                offsetting,
                write_back,
                rd,
                base_register,
                offset_kind,
            } => {
                let sign = match offsetting {
                    Offsetting::Up => "",
                    Offsetting::Down => "-",
                };
                let offset = match offset_kind {
                    HalfwordDataTransferOffsetKind::Immediate { offset: 0 } => String::new(),
                    HalfwordDataTransferOffsetKind::Immediate { offset } => {
                        format!(", #{sign}{offset}")
                    }
                    HalfwordDataTransferOffsetKind::Register { register } => {
                        format!(", {sign}{}", register_name(*register))
                    }
                };
                let address = format_address(*base_register, &offset, *indexing, *write_back);
                let name = transfer_kind.to_string();
                let (mnemonic, suffix) = name.split_at(3);

                format!("{mnemonic}{condition}{suffix} {}, {address}", register_name(*rd))
            }
            Self::BlockDataTransfer {
                indexing,
                offsetting,
                load_psr,
                write_back,
                load_store,
                rn,
                register_list,
            } => {
                let op = match load_store {
                    LoadStoreKind::Store => "STM",
                    LoadStoreKind::Load => "LDM",
                };
                let offset_modifier = match offsetting {
                    Offsetting::Down => "D",
                    Offsetting::Up => "I",
                };
                let index_type = match indexing {
                    Indexing::Pre => "B",
                    Indexing::Post => "A",
                };

                let registers = (0..16)
                    .filter(|reg| register_list.get_bit(*reg))
                    .map(|reg| register_name(usize::from(reg)))
                    .collect::<Vec<_>>()
                    .join(", ");

                let w = if *write_back { "!" } else { "" };
                let psr = if *load_psr { "^" } else { "" };
                format!(
                    "{op}{condition}{offset_modifier}{index_type} {}{w}, {{{registers}}}{psr}",
                    register_name(*rn)
                )
            }
            Self::Branch { link, offset } => {
                let link = if *link { "L" } else { "" };
                format!("B{link}{condition} PC{offset:+}")
            }
            Self::SoftwareInterrupt { comment } => format!("SWI{condition} 0x{comment:06X}"),
            Self::Undefined => "UNDEFINED".to_string(),
        }
    }
}

fn format_address(base: usize, offset: &str, indexing: Indexing, write_back: bool) -> String {
    let rn = register_name(base);
    match indexing {
        Indexing::Pre => {
            let w = if write_back { "!" } else { "" };
            format!("[{rn}{offset}]{w}")
        }
        Indexing::Post => format!("[{rn}]{offset}"),
    }
}

impl From<u32> for ArmModeInstruction {
    fn from(op_code: u32) -> Self {
        match op_code.get_bits(25..=27) {
            0b000 => decode_class_zero(op_code),
            0b001 => {
                if op_code.get_bits(23..=24) == 0b10 && !op_code.get_bit(20) {
                    if op_code.get_bit(21) {
                        Self::PsrTransfer {
                            psr_kind: op_code.get_bit(22).into(),
                            kind: PsrOpKind::Msr {
                                field_mask: op_code.get_bits(16..=19) as u8,
                                operand: MsrOperand::Immediate {
                                    base: op_code.get_bits(0..=7),
                                    shift: op_code.get_bits(8..=11) * 2,
                                },
                            },
                        }
                    } else {
                        Self::Undefined
                    }
                } else {
                    decode_data_processing(op_code)
                }
            }
            0b010 | 0b011 => decode_single_data_transfer(op_code),
            0b100 => Self::BlockDataTransfer {
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                load_psr: op_code.get_bit(22),
                write_back: op_code.get_bit(21),
                load_store: op_code.get_bit(20).into(),
                rn: op_code.get_bits(16..=19) as usize,
                register_list: op_code.get_bits(0..=15) as u16,
            },
            0b101 => Self::Branch {
                link: op_code.get_bit(24),
                offset: (op_code.get_bits(0..=23).sign_extended(24) << 2) as i32,
            },
            0b110 => Self::Undefined,
            _ => {
                if op_code.get_bit(24) {
                    Self::SoftwareInterrupt {
                        comment: op_code.get_bits(0..=23),
                    }
                } else {
                    Self::Undefined
                }
            }
        }
    }
}

fn decode_class_zero(op_code: u32) -> ArmModeInstruction {
    let rd = op_code.get_bits(12..=15) as usize;
    let rm = op_code.get_bits(0..=3) as usize;

    if op_code.get_bit(7) && op_code.get_bit(4) {
        let sh_bits = op_code.get_bits(5..=6);
        if sh_bits == 0b00 {
            return decode_multiply(op_code);
        }

        let Some(transfer_kind) = HalfwordTransferKind::decode(op_code.get_bit(20), sh_bits)
        else {
            return ArmModeInstruction::Undefined;
        };

        let offset_kind = match OperandKind::from(op_code.get_bit(22)) {
            OperandKind::Immediate => HalfwordDataTransferOffsetKind::Immediate {
                offset: (op_code.get_bits(8..=11) << 4) | op_code.get_bits(0..=3),
            },
            OperandKind::Register => HalfwordDataTransferOffsetKind::Register { register: rm },
        };

        return ArmModeInstruction::HalfwordDataTransfer {
            transfer_kind,
            indexing: op_code.get_bit(24).into(),
            offsetting: op_code.get_bit(23).into(),
            write_back: op_code.get_bit(21),
            rd,
            base_register: op_code.get_bits(16..=19) as usize,
            offset_kind,
        };
    }

    if op_code.get_bits(23..=24) == 0b10 && !op_code.get_bit(20) {
        let psr_kind: PsrKind = op_code.get_bit(22).into();
        return match (op_code.get_bits(4..=7), op_code.get_bits(21..=22)) {
            (0b0000, 0b00 | 0b10) => ArmModeInstruction::PsrTransfer {
                psr_kind,
                kind: PsrOpKind::Mrs {
                    destination_register: rd,
                },
            },
            (0b0000, 0b01 | 0b11) => ArmModeInstruction::PsrTransfer {
                psr_kind,
                kind: PsrOpKind::Msr {
                    field_mask: op_code.get_bits(16..=19) as u8,
                    operand: MsrOperand::Register(rm),
                },
            },
            (0b0001, 0b01) => ArmModeInstruction::BranchAndExchange {
                link: false,
                register: rm,
            },
            (0b0011, 0b01) => ArmModeInstruction::BranchAndExchange {
                link: true,
                register: rm,
            },
            (0b0001, 0b11) => ArmModeInstruction::CountLeadingZeros { rd, rm },
            _ => {
                tracing::debug!("undefined miscellaneous instruction 0x{op_code:08X}");
                ArmModeInstruction::Undefined
            }
        };
    }

    decode_data_processing(op_code)
}

fn decode_multiply(op_code: u32) -> ArmModeInstruction {
    let set_conditions = op_code.get_bit(20);
    let rs = op_code.get_bits(8..=11) as usize;
    let rm = op_code.get_bits(0..=3) as usize;

    match op_code.get_bits(23..=24) {
        0b00 if !op_code.get_bit(22) => ArmModeInstruction::Multiply {
            accumulate: op_code.get_bit(21),
            set_conditions,
            rd: op_code.get_bits(16..=19) as usize,
            rn: op_code.get_bits(12..=15) as usize,
            rs,
            rm,
        },
        0b01 => ArmModeInstruction::MultiplyLong {
            variant: op_code.into(),
            set_conditions,
            rd_hi: op_code.get_bits(16..=19) as usize,
            rd_lo: op_code.get_bits(12..=15) as usize,
            rs,
            rm,
        },
        // SWP/SWPB and the rest of the space are not part of this core.
        _ => ArmModeInstruction::Undefined,
    }
}

fn decode_data_processing(op_code: u32) -> ArmModeInstruction {
    let op2 = match OperandKind::from(op_code.get_bit(25)) {
        OperandKind::Immediate => AluSecondOperandInfo::Immediate {
            base: op_code.get_bits(0..=7),
            shift: op_code.get_bits(8..=11) * 2,
        },
        OperandKind::Register => {
            let shift_op = if op_code.get_bit(4) {
                ShiftOperator::Register(op_code.get_bits(8..=11) as usize)
            } else {
                ShiftOperator::Immediate(op_code.get_bits(7..=11))
            };
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind: op_code.get_bits(5..=6).into(),
                register: op_code.get_bits(0..=3) as usize,
            }
        }
    };

    let alu_instruction = ArmModeAluInstruction::from(op_code.get_bits(21..=24));

    ArmModeInstruction::DataProcessing {
        alu_instruction,
        // Test instructions without S live in the miscellaneous space, so
        // any that reach here set the flags.
        set_conditions: op_code.get_bit(20) || alu_instruction.is_test(),
        rn: op_code.get_bits(16..=19) as usize,
        destination: op_code.get_bits(12..=15) as usize,
        op2,
    }
}

fn decode_single_data_transfer(op_code: u32) -> ArmModeInstruction {
    // Register offsets with bit 4 set are the media instruction space.
    let register_offset = op_code.get_bit(25);
    if register_offset && op_code.get_bit(4) {
        return ArmModeInstruction::Undefined;
    }

    let offset_info = if register_offset {
        SingleDataTransferOffsetInfo::RegisterImmediate {
            shift_amount: op_code.get_bits(7..=11),
            shift_kind: op_code.get_bits(5..=6).into(),
            reg_offset: op_code.get_bits(0..=3) as usize,
        }
    } else {
        SingleDataTransferOffsetInfo::Immediate {
            offset: op_code.get_bits(0..=11),
        }
    };

    ArmModeInstruction::SingleDataTransfer {
        load_store: op_code.get_bit(20).into(),
        quantity: op_code.get_bit(22).into(),
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        write_back: op_code.get_bit(21),
        rd: op_code.get_bits(12..=15) as usize,
        base_register: op_code.get_bits(16..=19) as usize,
        offset_info,
    }
}
