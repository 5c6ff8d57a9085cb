//! # ARM Instruction Set (32-bit)
//!
//! Every instruction is conditionally executed.
//!
//! ## Format
//!
//! ```text
//! 31-28   27-25   24-0
//! [Cond] [Class] [Instruction-specific]
//! ```
//!
//! - **Condition (bits 28-31)**: See [`condition`](super::condition)
//! - **Class (bits 25-27)**: Determines instruction category
//!
//! ## Instruction Categories
//!
//! | Bits 27-25 | Category              | Examples                       |
//! |------------|-----------------------|--------------------------------|
//! | 00x        | Data Processing       | AND, ADD, CMP, MOV             |
//! | 000        | Multiply/Misc/Extra   | MUL, UMULL, BX, CLZ, MRS, LDRH |
//! | 001        | MSR immediate         | MSR CPSR_f, #0xF0000000        |
//! | 01x        | Single Data Transfer  | LDR, STR                       |
//! | 100        | Block Data Transfer   | LDM, STM                       |
//! | 101        | Branch                | B, BL                          |
//! | 111        | Software Interrupt    | SWI                            |
//!
//! ## Submodules
//!
//! - [`instructions`] - Decoding (`From<u32>`) and disassembly
//! - [`mode`] - Condition plus decoded instruction
//! - [`alu_instruction`] - ALU ops and barrel shifter
//! - [`data_processing`], [`load_store`], [`branch`], [`psr_transfer`] - Execution

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
pub mod alu_instruction;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
pub mod instructions;

#[allow(clippy::cast_possible_truncation)]
pub mod mode;

pub mod branch;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
pub mod data_processing;

#[allow(clippy::cast_possible_truncation)]
pub mod load_store;

pub mod psr_transfer;
