//! Decoded VM instructions.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use neo_config::MAX_SYSCALL_NAME_LENGTH;
use neo_core::UInt160;

/// One decoded instruction: the opcode, where it starts and its operand bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: OpCode,
    pointer: usize,
    size: usize,
    operand: Vec<u8>,
}

impl Instruction {
    /// The implicit `RET` executed when the pointer reaches the end of a script.
    pub fn ret(pointer: usize) -> Self {
        Self {
            opcode: OpCode::RET,
            pointer,
            size: 1,
            operand: Vec::new(),
        }
    }

    /// Decodes the instruction starting at `ip`.
    ///
    /// Operand lengths are validated against the script before anything is
    /// read, so truncated scripts fail instead of reading out of bounds.
    pub fn decode(script: &[u8], ip: usize) -> VmResult<Self> {
        if ip >= script.len() {
            return Ok(Self::ret(ip));
        }
        let opcode = OpCode::try_from(script[ip])?;
        let layout = opcode.operand_size();
        let mut cursor = ip + 1;

        let operand_len = if layout.has_size_prefix() {
            let prefix = layout.size_prefix();
            let bytes = slice(script, cursor, prefix)?;
            cursor += prefix;
            let len = bytes
                .iter()
                .rev()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize);
            if opcode == OpCode::SYSCALL && len > MAX_SYSCALL_NAME_LENGTH {
                return Err(VmError::invalid_script_msg(format!(
                    "syscall name of {len} bytes at {ip}"
                )));
            }
            len
        } else {
            layout.size()
        };

        let operand = slice(script, cursor, operand_len)?.to_vec();
        Ok(Self {
            opcode,
            pointer: ip,
            size: cursor + operand_len - ip,
            operand,
        })
    }

    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Offset of the opcode byte within its script.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Encoded length including opcode, prefix and operand.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    /// Reads the signed 16-bit jump offset at `offset` within the operand.
    pub fn token_i16(&self, offset: usize) -> VmResult<i16> {
        let bytes = slice(&self.operand, offset, 2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn token_u8(&self, offset: usize) -> VmResult<u8> {
        Ok(slice(&self.operand, offset, 1)?[0])
    }

    /// Reads a 20-byte script hash at `offset` within the operand.
    pub fn token_hash(&self, offset: usize) -> VmResult<UInt160> {
        let bytes = slice(&self.operand, offset, UInt160::LENGTH)?;
        UInt160::from_bytes(bytes).map_err(|e| VmError::invalid_script_msg(e.to_string()))
    }

    /// Interprets the operand as an ASCII syscall name; non-ASCII bytes read as `?`.
    pub fn syscall_name(&self) -> String {
        self.operand
            .iter()
            .map(|b| if b.is_ascii() { *b as char } else { '?' })
            .collect()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04} {}", self.pointer, self.opcode)?;
        match self.opcode {
            OpCode::SYSCALL => write!(f, " {}", self.syscall_name()),
            _ if !self.operand.is_empty() => {
                let hex: String = self.operand.iter().map(|b| format!("{b:02x}")).collect();
                write!(f, " 0x{hex}")
            }
            _ => Ok(()),
        }
    }
}

fn slice(data: &[u8], start: usize, len: usize) -> VmResult<&[u8]> {
    start
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .map(|end| &data[start..end])
        .ok_or_else(|| {
            VmError::invalid_script_msg(format!(
                "operand of {len} bytes at {start} exceeds script length {}",
                data.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_inline_and_prefixed_operands() {
        let script = [0x02, 0xAA, 0xBB, 0x4C, 0x01, 0xCC, 0x4D, 0x02, 0x00, 0x01, 0x02];
        let first = Instruction::decode(&script, 0).unwrap();
        assert_eq!(first.opcode(), OpCode::PUSHBYTES2);
        assert_eq!(first.operand(), &[0xAA, 0xBB]);
        assert_eq!(first.size(), 3);

        let second = Instruction::decode(&script, 3).unwrap();
        assert_eq!(second.opcode(), OpCode::PUSHDATA1);
        assert_eq!(second.operand(), &[0xCC]);
        assert_eq!(second.size(), 3);

        let third = Instruction::decode(&script, 6).unwrap();
        assert_eq!(third.operand(), &[0x01, 0x02]);
        assert_eq!(third.size(), 5);
    }

    #[test]
    fn truncated_operands_are_rejected() {
        assert!(Instruction::decode(&[0x05, 0x01], 0).is_err());
        assert!(Instruction::decode(&[0x4E, 0xFF, 0xFF, 0xFF, 0xFF, 0x00], 0).is_err());
        assert!(Instruction::decode(&[0x62, 0x01], 0).is_err());
        assert!(Instruction::decode(&[0x67; 5], 0).is_err());
    }

    #[test]
    fn past_the_end_is_ret() {
        let instruction = Instruction::decode(&[0x51], 1).unwrap();
        assert_eq!(instruction.opcode(), OpCode::RET);
    }

    #[test]
    fn unknown_opcode_fails() {
        assert_eq!(
            Instruction::decode(&[0x50], 0),
            Err(VmError::UnknownOpcode(0x50))
        );
    }

    #[test]
    fn syscall_names() {
        let mut script = vec![0x68, 4];
        script.extend_from_slice(b"Neo\xff");
        let instruction = Instruction::decode(&script, 0).unwrap();
        assert_eq!(instruction.syscall_name(), "Neo?");
        assert_eq!(instruction.to_string(), "0000 SYSCALL Neo?");

        let mut long = vec![0x68, 253];
        long.extend(std::iter::repeat(b'a').take(253));
        assert!(Instruction::decode(&long, 0).is_err());
    }

    #[test]
    fn jump_tokens() {
        let instruction = Instruction::decode(&[0x62, 0xFD, 0xFF], 0).unwrap();
        assert_eq!(instruction.token_i16(0).unwrap(), -3);
    }
}
