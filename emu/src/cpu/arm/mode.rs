use crate::bitwise::Bits;
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::condition::Condition;

/// A fetched word split into its condition and decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmModeOpcode {
    pub instruction: ArmModeInstruction,
    pub condition: Condition,
    pub raw: u32,
}

impl ArmModeOpcode {
    #[must_use]
    pub fn disassembler(&self) -> String {
        self.instruction.disassembler(self.condition)
    }
}

impl From<u32> for ArmModeOpcode {
    fn from(op_code: u32) -> Self {
        Self {
            instruction: ArmModeInstruction::from(op_code),
            condition: Condition::from(op_code.get_bits(28..=31) as u8),
            raw: op_code,
        }
    }
}

impl std::ops::Deref for ArmModeOpcode {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Bit layout dump, handy when a decode looks wrong.
impl std::fmt::Display for ArmModeOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let instruction = format!("INS: {}\n", self.disassembler());

        let bytes_pos1 = "POS: |..3 ..................2 ..................1 ..................0|\n";
        let bytes_pos2 = "     |1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|\n";

        let op_code_format: &str = match &self.instruction {
            ArmModeInstruction::DataProcessing { .. } => {
                "FMT: |_Cond__|0_0|I|_code__|S|__Rn___|__Rd___|_______operand2________|"
            }
            ArmModeInstruction::Multiply { .. } => {
                "FMT: |_Cond__|0_0_0_0_0_0|A|S|__Rd___|__Rn___|__Rs___|1_0_0_1|__Rm___|"
            }
            ArmModeInstruction::MultiplyLong { .. } => {
                "FMT: |_Cond__|0_0_0_0_1|U|A|S|_RdHi__|_RdLo__|__Rs___|1_0_0_1|__Rm___|"
            }
            ArmModeInstruction::CountLeadingZeros { .. } => {
                "FMT: |_Cond__|0_0_0_1_0_1_1_0|1_1_1_1|__Rd___|1_1_1_1|0_0_0_1|__Rm___|"
            }
            ArmModeInstruction::BranchAndExchange { .. } => {
                "FMT: |_Cond__|0_0_0_1_0_0_1_0|1_1_1_1|1_1_1_1|1_1_1_1|0_0|L|1|__Rm___|"
            }
            ArmModeInstruction::PsrTransfer { .. } => {
                "FMT: |_Cond__|0_0|I|1_0|R|x|0|_Mask__|__Rd___|_______operand_________|"
            }
            ArmModeInstruction::HalfwordDataTransfer { .. } => {
                "FMT: |_Cond__|0_0_0|P|U|I|W|L|__Rn___|__Rd___|_Offset|1|S|H|1|_Offset|"
            }
            ArmModeInstruction::SingleDataTransfer { .. } => {
                "FMT: |_Cond__|0_1|I|P|U|B|W|L|__Rn___|__Rd___|________Offset_________|"
            }
            ArmModeInstruction::BlockDataTransfer { .. } => {
                "FMT: |_Cond__|1_0_0|P|U|S|W|L|__Rn___|_____________Reg_List__________|"
            }
            ArmModeInstruction::Branch { .. } => {
                "FMT: |_Cond__|1_0_1|L|______________________Offset___________________|"
            }
            ArmModeInstruction::SoftwareInterrupt { .. } => {
                "FMT: |_Cond__|1_1_1_1|_____________________Comment___________________|"
            }
            ArmModeInstruction::Undefined => "FMT: |_Cond__|",
        };

        let mut raw_bits = String::new();
        for i in format!("{:#034b}", self.raw).chars().skip(2) {
            raw_bits.push(i);
            raw_bits.push('_');
        }
        raw_bits.pop();
        let raw_bits = format!("RAW: |{raw_bits}|\n");

        writeln!(
            f,
            "{instruction}{bytes_pos1}{bytes_pos2}{raw_bits}{op_code_format}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn condition_is_split_from_instruction() {
        let op_code = ArmModeOpcode::from(0x0A00_0002);
        assert_eq!(op_code.condition, Condition::EQ);
        assert_eq!(
            op_code.instruction,
            ArmModeInstruction::Branch {
                link: false,
                offset: 8
            }
        );
        assert_eq!(*op_code, 0x0A00_0002);
        assert_eq!(op_code.disassembler(), "BEQ PC+8");
    }

    #[test]
    fn bit_layout_dump() {
        let dump = ArmModeOpcode::from(0xE3A0_0001).to_string();
        assert!(dump.starts_with("INS: MOV R0, #1\n"));
        assert!(dump.contains("RAW: |1_1_1_0_0_0_1_1_1_0_1_0_"));
        assert!(dump.contains("FMT: |_Cond__|0_0|I|"));
    }
}
