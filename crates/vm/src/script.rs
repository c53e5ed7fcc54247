//! Immutable script buffers.

use crate::error::VmResult;
use crate::instruction::Instruction;
use neo_core::UInt160;
use neo_cryptography::hash160;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A script and its lazily computed hash.
///
/// Contexts share scripts through `Rc`; decoded instructions are cached per
/// offset so loops do not re-decode large literals.
#[derive(Debug, Default)]
pub struct Script {
    bytes: Vec<u8>,
    hash: OnceCell<UInt160>,
    instructions: RefCell<HashMap<usize, Rc<Instruction>>>,
}

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            hash: OnceCell::new(),
            instructions: RefCell::new(HashMap::new()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hash160 of the script bytes.
    pub fn hash(&self) -> UInt160 {
        *self.hash.get_or_init(|| UInt160::from(hash160(&self.bytes)))
    }

    /// Returns the instruction at `ip`, decoding it on first use.
    pub fn get_instruction(&self, ip: usize) -> VmResult<Rc<Instruction>> {
        if let Some(instruction) = self.instructions.borrow().get(&ip) {
            return Ok(Rc::clone(instruction));
        }
        let instruction = Rc::new(Instruction::decode(&self.bytes, ip)?);
        self.instructions
            .borrow_mut()
            .insert(ip, Rc::clone(&instruction));
        Ok(instruction)
    }

    /// Decodes the whole script front to back.
    pub fn instructions(&self) -> VmResult<Vec<Rc<Instruction>>> {
        let mut out = Vec::new();
        let mut ip = 0;
        while ip < self.bytes.len() {
            let instruction = self.get_instruction(ip)?;
            ip += instruction.size();
            out.push(instruction);
        }
        Ok(out)
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_code::OpCode;

    #[test]
    fn hash_is_hash160_of_bytes() {
        let script = Script::new(vec![0x51, 0x52, 0x93]);
        assert_eq!(script.hash().as_bytes(), &hash160(&[0x51, 0x52, 0x93]));
        assert_eq!(script.hash(), script.hash());
    }

    #[test]
    fn instructions_walk_the_script() {
        let script = Script::new(vec![0x01, 0xAA, 0x51, 0x66]);
        let ops: Vec<OpCode> = script
            .instructions()
            .unwrap()
            .iter()
            .map(|i| i.opcode())
            .collect();
        assert_eq!(ops, vec![OpCode::PUSHBYTES1, OpCode::PUSH1, OpCode::RET]);
        assert!(Rc::ptr_eq(
            &script.get_instruction(2).unwrap(),
            &script.get_instruction(2).unwrap()
        ));
    }
}
