//! Splice operations on byte arrays.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{pop_count, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the splice operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::CAT, cat);
    jump_table.register(OpCode::SUBSTR, substr);
    jump_table.register(OpCode::LEFT, left);
    jump_table.register(OpCode::RIGHT, right);
    jump_table.register(OpCode::SIZE, size);
}

fn cat(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_bytes()?;
    let x1 = engine.pop_bytes()?;
    let mut result = Vec::with_capacity(x1.len() + x2.len());
    result.extend_from_slice(&x1);
    result.extend_from_slice(&x2);
    engine.push(StackItem::from(result))
}

/// An index past the end yields an empty result; the count is clamped.
fn substr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_count(engine)?;
    let index = pop_count(engine)?;
    let x = engine.pop_bytes()?;
    let start = index.min(x.len());
    let end = start.saturating_add(count).min(x.len());
    engine.push(StackItem::from(&x[start..end]))
}

fn left(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_count(engine)?;
    let x = engine.pop_bytes()?;
    let item = if count >= x.len() {
        StackItem::ByteArray(x)
    } else {
        StackItem::from(&x[..count])
    };
    engine.push(item)
}

fn right(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_count(engine)?;
    let x = engine.pop_bytes()?;
    if count > x.len() {
        return Err(VmError::invalid_operation_msg(format!(
            "RIGHT {count} of {} bytes",
            x.len()
        )));
    }
    engine.push(StackItem::from(&x[x.len() - count..]))
}

fn size(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bytes()?;
    engine.push(StackItem::from(x.len()))
}
