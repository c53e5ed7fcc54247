//! Stack operations for the Neo Virtual Machine.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{pop_count, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the stack operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::DUPFROMALTSTACK, dup_from_alt_stack);
    jump_table.register(OpCode::TOALTSTACK, to_alt_stack);
    jump_table.register(OpCode::FROMALTSTACK, from_alt_stack);
    jump_table.register(OpCode::XDROP, xdrop);
    jump_table.register(OpCode::XSWAP, xswap);
    jump_table.register(OpCode::XTUCK, xtuck);
    jump_table.register(OpCode::DEPTH, depth);
    jump_table.register(OpCode::DROP, drop_top);
    jump_table.register(OpCode::DUP, dup);
    jump_table.register(OpCode::NIP, nip);
    jump_table.register(OpCode::OVER, over);
    jump_table.register(OpCode::PICK, pick);
    jump_table.register(OpCode::ROLL, roll);
    jump_table.register(OpCode::ROT, rot);
    jump_table.register(OpCode::SWAP, swap);
    jump_table.register(OpCode::TUCK, tuck);
}

fn dup_from_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let context = engine.context_mut()?;
    let item = context.alt_stack().peek(0)?.clone();
    context.push(item);
    Ok(())
}

fn to_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let context = engine.context_mut()?;
    let item = context.pop()?;
    context.alt_stack_mut().push(item);
    Ok(())
}

fn from_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let context = engine.context_mut()?;
    let item = context.alt_stack_mut().pop()?;
    context.push(item);
    Ok(())
}

/// Removes the item `n` back.
fn xdrop(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_count(engine)?;
    engine.context_mut()?.evaluation_stack_mut().remove(n)?;
    Ok(())
}

/// Swaps the top item with the one `n` back. `n == 0` is a no-op.
fn xswap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_count(engine)?;
    if n == 0 {
        return Ok(());
    }
    engine.context_mut()?.evaluation_stack_mut().swap(0, n)
}

/// Copies the top item to `n` back. `n` must be positive.
fn xtuck(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_count(engine)?;
    if n == 0 {
        return Err(crate::error::VmError::invalid_operation_msg(
            "XTUCK position must be positive",
        ));
    }
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let item = stack.peek(0)?.clone();
    stack.insert(n, item)
}

fn depth(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let depth = engine.context()?.evaluation_stack().len();
    engine.push(StackItem::from(depth))
}

fn drop_top(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.pop()?;
    Ok(())
}

fn dup(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.peek(0)?.clone();
    engine.push(item)
}

fn nip(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.context_mut()?.evaluation_stack_mut().remove(1)?;
    Ok(())
}

fn over(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.peek(1)?.clone();
    engine.push(item)
}

fn pick(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_count(engine)?;
    let item = engine.peek(n)?.clone();
    engine.push(item)
}

/// Moves the item `n` back to the top. `n == 0` is a no-op.
fn roll(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_count(engine)?;
    if n == 0 {
        return Ok(());
    }
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let item = stack.remove(n)?;
    stack.push(item);
    Ok(())
}

fn rot(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let item = stack.remove(2)?;
    stack.push(item);
    Ok(())
}

fn swap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let item = stack.remove(1)?;
    stack.push(item);
    Ok(())
}

fn tuck(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let item = stack.peek(0)?.clone();
    stack.insert(2, item)
}
