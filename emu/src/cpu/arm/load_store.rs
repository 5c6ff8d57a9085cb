//! # Load/Store Unit
//!
//! ## Single transfers
//!
//! ```text
//!              address used        base written back
//! offset       Rn ± offset         no
//! pre-index    Rn ± offset         Rn ± offset   (W = 1)
//! post-index   Rn                  Rn ± offset   (always)
//! ```
//!
//! The base is only updated once the memory access succeeded, so an abort
//! leaves every register untouched. When a load also writes back into its
//! own destination, the loaded value wins.
//!
//! ## Block transfers
//!
//! For `n` registers the lowest register always goes to the lowest address:
//!
//! ```text
//! IA   Rn         .. Rn + 4n - 4
//! IB   Rn + 4     .. Rn + 4n
//! DA   Rn - 4n + 4 .. Rn
//! DB   Rn - 4n    .. Rn - 4
//! ```

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::immediate_shift;
use crate::cpu::arm::instructions::{
    HalfwordDataTransferOffsetKind, HalfwordTransferKind, SingleDataTransferOffsetInfo,
};
use crate::cpu::arm_core::ArmCore;
use crate::cpu::exception::Exception;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};
use crate::memory::Memory;

/// First and last word address touched by a block transfer of `count`
/// registers.
#[must_use]
pub const fn block_transfer_range(
    base: u32,
    indexing: Indexing,
    offsetting: Offsetting,
    count: u32,
) -> (u32, u32) {
    let bytes = count.wrapping_mul(4);
    match (offsetting, indexing) {
        (Offsetting::Up, Indexing::Post) => (base, base.wrapping_add(bytes).wrapping_sub(4)),
        (Offsetting::Up, Indexing::Pre) => (base.wrapping_add(4), base.wrapping_add(bytes)),
        (Offsetting::Down, Indexing::Post) => (base.wrapping_sub(bytes).wrapping_add(4), base),
        (Offsetting::Down, Indexing::Pre) => (base.wrapping_sub(bytes), base.wrapping_sub(4)),
    }
}

impl<M: Memory> ArmCore<M> {
    /// Writes a loaded value. A load into PC switches state on bit 0.
    fn write_loaded(&mut self, rd: usize, value: u32) {
        if rd == REG_PROGRAM_COUNTER {
            self.jump_interworking(value);
        } else {
            self.registers.write(rd, value);
        }
    }

    /// Returns `(transfer address, written back address)`.
    fn indexed_address(
        &self,
        base_register: usize,
        offset: u32,
        indexing: Indexing,
        offsetting: Offsetting,
    ) -> (u32, u32) {
        let base = self.read_operand(base_register);
        let offset_address = offsetting.apply(base, offset);
        match indexing {
            Indexing::Pre => (offset_address, offset_address),
            Indexing::Post => (base, offset_address),
        }
    }

    /// LDR, LDRB, STR and STRB. Post-indexing with W set (the T variants) is
    /// handled as plain post-indexing.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn single_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
    ) -> Result<(), Exception> {
        let offset = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                let carry = self.registers.cpsr().carry_flag();
                immediate_shift(shift_kind, shift_amount, self.read_operand(reg_offset), carry)
                    .result
            }
        };

        let (address, new_base) = self.indexed_address(base_register, offset, indexing, offsetting);
        let writes_back = write_back || indexing == Indexing::Post;

        match load_store {
            LoadStoreKind::Load => {
                let value = match quantity {
                    ReadWriteKind::Word => self.memory().read_word(address)?,
                    ReadWriteKind::Byte => u32::from(self.memory().read_byte(address)?),
                };

                if writes_back {
                    self.registers.write(base_register, new_base);
                }
                self.write_loaded(rd, value);
            }
            LoadStoreKind::Store => {
                // STR PC stores the instruction address + 8.
                let value = self.read_operand(rd);
                match quantity {
                    ReadWriteKind::Word => self.memory_mut().write_word(address, value)?,
                    ReadWriteKind::Byte => self.memory_mut().write_byte(address, value as u8)?,
                }

                if writes_back {
                    self.registers.write(base_register, new_base);
                }
            }
        }

        Ok(())
    }

    /// LDRH, STRH, LDRSB, LDRSH, LDRD and STRD.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn half_word_data_transfer(
        &mut self,
        transfer_kind: HalfwordTransferKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rd: usize,
        base_register: usize,
        offset_kind: HalfwordDataTransferOffsetKind,
    ) -> Result<(), Exception> {
        let offset = match offset_kind {
            HalfwordDataTransferOffsetKind::Immediate { offset } => offset,
            HalfwordDataTransferOffsetKind::Register { register } => self.read_operand(register),
        };

        let (address, new_base) = self.indexed_address(base_register, offset, indexing, offsetting);
        let writes_back = write_back || indexing == Indexing::Post;

        if transfer_kind.is_doubleword() && (rd % 2 != 0 || rd == REG_LR || address % 8 != 0) {
            tracing::warn!(
                "{transfer_kind} with R{rd} at 0x{address:08X} is unpredictable, ignored"
            );
            return Ok(());
        }

        let loaded = match transfer_kind {
            HalfwordTransferKind::Ldrh => Some(u32::from(self.memory().read_half_word(address)?)),
            HalfwordTransferKind::Ldrsb => {
                Some(u32::from(self.memory().read_byte(address)?).sign_extended(8))
            }
            HalfwordTransferKind::Ldrsh => {
                Some(u32::from(self.memory().read_half_word(address)?).sign_extended(16))
            }
            HalfwordTransferKind::Ldrd => {
                let low = self.memory().read_word(address)?;
                let high = self.memory().read_word(address.wrapping_add(4))?;

                if writes_back {
                    self.registers.write(base_register, new_base);
                }
                self.registers.write(rd, low);
                self.registers.write(rd + 1, high);
                return Ok(());
            }
            HalfwordTransferKind::Strh => {
                let value = self.read_operand(rd);
                self.memory_mut().write_half_word(address, value as u16)?;
                None
            }
            HalfwordTransferKind::Strd => {
                let low = self.read_operand(rd);
                let high = self.read_operand(rd + 1);
                self.memory_mut().write_word(address, low)?;
                self.memory_mut()
                    .write_word(address.wrapping_add(4), high)?;
                None
            }
        };

        if writes_back {
            self.registers.write(base_register, new_base);
        }
        if let Some(value) = loaded {
            self.write_loaded(rd, value);
        }

        Ok(())
    }

    /// LDM and STM.
    ///
    /// With the S bit set, STM and LDM without PC transfer the User bank;
    /// LDM with PC also copies SPSR into CPSR.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn block_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: usize,
        register_list: u16,
    ) -> Result<(), Exception> {
        if register_list == 0 {
            tracing::warn!("block transfer with an empty register list ignored");
            return Ok(());
        }

        let base = self.read_operand(rn);
        let count = register_list.count_ones();
        let (start_address, _) = block_transfer_range(base, indexing, offsetting, count);
        let new_base = offsetting.apply(base, count * 4);

        let pc_in_list = register_list.get_bit(15);
        let user_bank = load_psr && !(load_store == LoadStoreKind::Load && pc_in_list);

        let registers = (0..16_u8)
            .filter(|reg| register_list.get_bit(*reg))
            .map(usize::from);

        match load_store {
            LoadStoreKind::Store => {
                let mut address = start_address;
                for reg in registers {
                    let value = if user_bank && reg != REG_PROGRAM_COUNTER {
                        self.registers.read_user(reg)
                    } else {
                        self.read_operand(reg)
                    };
                    self.memory_mut().write_word(address, value)?;
                    address = address.wrapping_add(4);
                }

                if write_back {
                    self.registers.write(rn, new_base);
                }
            }
            LoadStoreKind::Load => {
                // Every word is read before any register changes so that an
                // abort part way leaves the registers intact.
                let mut values = [0; 16];
                let mut address = start_address;
                for reg in registers.clone() {
                    values[reg] = self.memory().read_word(address)?;
                    address = address.wrapping_add(4);
                }

                if write_back && !register_list.get_bit(rn as u8) {
                    self.registers.write(rn, new_base);
                }

                for reg in registers {
                    if user_bank {
                        self.registers.write_user(reg, values[reg]);
                    } else if reg == REG_PROGRAM_COUNTER {
                        if load_psr {
                            match self.registers.spsr() {
                                Some(spsr) => self.registers.set_cpsr(spsr),
                                None => tracing::warn!(
                                    "LDM with CPSR restore in {} mode has no SPSR",
                                    self.registers.mode()
                                ),
                            }
                        }
                        self.jump_interworking(values[reg]);
                    } else {
                        self.registers.write(reg, values[reg]);
                    }
                }
            }
        }

        Ok(())
    }
}
