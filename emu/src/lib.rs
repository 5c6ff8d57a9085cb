//! An instruction-level simulator of an ARMv5T core: banked registers,
//! conditional execution, the barrel shifter, loads and stores, and the
//! exception model, on top of a pluggable [`memory::Memory`].

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod cpu;

#[allow(clippy::cast_possible_truncation)]
pub mod memory;
