//! THROW and THROWIFNOT. Neither can be caught: both end execution in FAULT.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;

pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::THROW, throw);
    jump_table.register(OpCode::THROWIFNOT, throw_if_not);
}

fn throw(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Err(VmError::Throw)
}

fn throw_if_not(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    if engine.pop_bool()? {
        Ok(())
    } else {
        Err(VmError::Throw)
    }
}
