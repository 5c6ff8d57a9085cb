pub mod arm;

#[allow(clippy::module_name_repetitions)]
pub mod arm_core;
pub mod condition;
pub mod cpu_modes;
pub mod exception;

#[allow(clippy::cast_possible_truncation)]
pub mod flags;
pub mod psr;

#[allow(clippy::cast_possible_truncation)]
pub mod register_bank;
pub mod registers;
