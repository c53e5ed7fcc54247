//! Jump table module for the Neo Virtual Machine.
//!
//! Maps every opcode byte to its handler. Handlers live in one submodule per
//! opcode family and register themselves through `register_handlers`.

pub mod bitwise;
pub mod compound;
pub mod control;
pub mod crypto;
pub mod exceptions;
pub mod numeric;
pub mod push;
pub mod splice;
pub mod stack;

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;

/// A function that executes one instruction.
pub type InstructionHandler = fn(&mut ExecutionEngine, &Instruction) -> VmResult<()>;

static DEFAULT: Lazy<JumpTable> = Lazy::new(JumpTable::new);

/// Opcode to handler table.
#[derive(Clone)]
pub struct JumpTable {
    handlers: [Option<InstructionHandler>; 256],
}

impl Default for JumpTable {
    /// A copy of the shared table with every opcode registered.
    fn default() -> Self {
        DEFAULT.clone()
    }
}

impl std::fmt::Debug for JumpTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JumpTable")
            .field(
                "registered",
                &self.handlers.iter().filter(|h| h.is_some()).count(),
            )
            .finish()
    }
}

impl JumpTable {
    /// Builds a table with every opcode registered.
    pub fn new() -> Self {
        let mut jump_table = Self::empty();
        jump_table.register_default_handlers();
        jump_table
    }

    /// A table with no handlers; every opcode is rejected.
    pub fn empty() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    pub fn register(&mut self, opcode: OpCode, handler: InstructionHandler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    pub fn get(&self, opcode: OpCode) -> Option<InstructionHandler> {
        self.handlers[opcode as usize]
    }

    pub fn execute(&self, engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
        match self.get(instruction.opcode()) {
            Some(handler) => handler(engine, instruction),
            None => Err(VmError::UnknownOpcode(instruction.opcode() as u8)),
        }
    }

    fn register_default_handlers(&mut self) {
        push::register_handlers(self);
        control::register_handlers(self);
        stack::register_handlers(self);
        splice::register_handlers(self);
        bitwise::register_handlers(self);
        numeric::register_handlers(self);
        crypto::register_handlers(self);
        compound::register_handlers(self);
        exceptions::register_handlers(self);
    }
}

/// Pops an integer used as a count, index or position.
pub(crate) fn pop_count(engine: &mut ExecutionEngine) -> VmResult<usize> {
    to_count(&engine.pop_int()?)
}

/// Counts must fit in `0..=i32::MAX`; anything else faults.
pub(crate) fn to_count(value: &BigInt) -> VmResult<usize> {
    value
        .to_i32()
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| VmError::invalid_operation_msg(format!("invalid count {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_has_a_handler() {
        let jump_table = JumpTable::new();
        for opcode in OpCode::ALL {
            assert!(
                jump_table.get(*opcode).is_some(),
                "no handler for {opcode}"
            );
        }
    }

    #[test]
    fn custom_handlers_replace_defaults() {
        fn custom(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
            Err(VmError::Throw)
        }

        let mut jump_table = JumpTable::default();
        jump_table.register(OpCode::NOP, custom);
        let mut engine = ExecutionEngine::new().with_jump_table(jump_table);
        engine.load_script(&[OpCode::NOP as u8][..]).unwrap();
        assert!(engine.execute().is_fault());
        assert_eq!(engine.fault_reason(), Some(&VmError::Throw));
    }

    #[test]
    fn empty_table_rejects_everything() {
        let mut engine = ExecutionEngine::new().with_jump_table(JumpTable::empty());
        engine.load_script(&[OpCode::NOP as u8][..]).unwrap();
        assert!(engine.execute().is_fault());
        assert_eq!(
            engine.fault_reason(),
            Some(&VmError::UnknownOpcode(OpCode::NOP as u8))
        );
    }
}
