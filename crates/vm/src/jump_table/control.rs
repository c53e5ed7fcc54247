//! Flow control operations: jumps, calls, returns and syscalls.

use crate::error::{VmError, VmResult};
use crate::execution_context::ExecutionContext;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::vm_state::VMState;
use neo_core::UInt160;
use std::rc::Rc;

/// Registers the flow control handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::NOP, nop);
    jump_table.register(OpCode::JMP, jmp);
    jump_table.register(OpCode::JMPIF, jmp);
    jump_table.register(OpCode::JMPIFNOT, jmp);
    jump_table.register(OpCode::CALL, call);
    jump_table.register(OpCode::RET, ret);
    jump_table.register(OpCode::APPCALL, app_call);
    jump_table.register(OpCode::TAILCALL, app_call);
    jump_table.register(OpCode::SYSCALL, syscall);
    jump_table.register(OpCode::CALL_I, call_i);
    jump_table.register(OpCode::CALL_E, call_external);
    jump_table.register(OpCode::CALL_ED, call_external);
    jump_table.register(OpCode::CALL_ET, call_external);
    jump_table.register(OpCode::CALL_EDT, call_external);
}

fn nop(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Ok(())
}

/// Resolves a relative jump. `base` is where the offset is measured from.
fn jump_target(script_len: usize, base: usize, offset: i16) -> VmResult<usize> {
    let target = base as i64 + i64::from(offset);
    if target < 0 || target > script_len as i64 {
        return Err(VmError::invalid_script_msg(format!(
            "jump target {target} outside script of {script_len} bytes"
        )));
    }
    Ok(target as usize)
}

/// JMP, JMPIF and JMPIFNOT. The target is validated before the condition is popped.
fn jmp(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let offset = instruction.token_i16(0)?;
    let context = engine.context_mut()?;
    let target = jump_target(context.script().len(), instruction.pointer(), offset)?;
    let taken = match instruction.opcode() {
        OpCode::JMPIF => context.pop()?.as_bool(),
        OpCode::JMPIFNOT => !context.pop()?.as_bool(),
        _ => true,
    };
    if taken {
        context.set_instruction_pointer(target);
        engine.set_jumping();
    }
    Ok(())
}

/// Completes a non-tail call once the callee is loaded: the caller, now at
/// index 1, resumes after `instruction` and hands over the top `count` items
/// (all when `None`).
fn enter_callee(
    engine: &mut ExecutionEngine,
    instruction: &Instruction,
    count: Option<usize>,
) -> VmResult<()> {
    let stack = engine.invocation_stack_mut();
    let caller = stack.peek_mut(1)?;
    caller.set_instruction_pointer(instruction.pointer() + instruction.size());
    let caller = caller.evaluation_stack_mut();
    let items = match count {
        Some(count) => caller.take_top(count)?,
        None => caller.take_all(),
    };
    stack.peek_mut(0)?.evaluation_stack_mut().extend(items);
    engine.set_jumping();
    Ok(())
}

/// Replaces the current context with `callee`, handing over the top `count`
/// items (all when `None`).
fn replace_caller(
    engine: &mut ExecutionEngine,
    callee: ExecutionContext,
    count: Option<usize>,
) -> VmResult<()> {
    let mut caller = engine.remove_context(0)?;
    let caller = caller.evaluation_stack_mut();
    let items = match count {
        Some(count) => caller.take_top(count)?,
        None => caller.take_all(),
    };
    engine.load_context(callee)?;
    engine.context_mut()?.evaluation_stack_mut().extend(items);
    engine.set_jumping();
    Ok(())
}

fn call(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let offset = instruction.token_i16(0)?;
    let context = engine.context()?;
    let target = jump_target(context.script().len(), instruction.pointer(), offset)?;
    let mut callee = ExecutionContext::new(Rc::clone(context.script()), -1);
    callee.set_instruction_pointer(target);

    engine.load_context(callee)?;
    enter_callee(engine, instruction, None)
}

fn call_i(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let rvcount = instruction.token_u8(0)?;
    let pcount = usize::from(instruction.token_u8(1)?);
    let offset = instruction.token_i16(2)?;
    let context = engine.context()?;
    if context.evaluation_stack().len() < pcount {
        return Err(VmError::stack_underflow_msg(
            pcount,
            context.evaluation_stack().len(),
        ));
    }
    let target = jump_target(context.script().len(), instruction.pointer() + 2, offset)?;
    let mut callee = ExecutionContext::new(Rc::clone(context.script()), i32::from(rvcount));
    callee.set_instruction_pointer(target);

    engine.load_context(callee)?;
    enter_callee(engine, instruction, Some(pcount))
}

/// Moves the values a finished context returns to its caller, or to the
/// result stack when it was the last one.
fn ret(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let context = engine.context()?;
    let available = context.evaluation_stack().len();
    let rvcount = match context.rvcount() {
        -1 => available,
        count => usize::try_from(count)
            .map_err(|_| VmError::invalid_operation_msg(format!("rvcount {count}")))?,
    };
    if available < rvcount {
        return Err(VmError::stack_underflow_msg(rvcount, available));
    }

    let mut context = engine.remove_context(0)?;
    let values = context.evaluation_stack_mut().take_top(rvcount)?;
    match engine.current_context_mut() {
        Some(caller) => {
            caller.evaluation_stack_mut().extend(values);
            if context.rvcount() == -1 {
                caller
                    .alt_stack_mut()
                    .extend(context.alt_stack_mut().take_all());
            }
        }
        None => engine.result_stack_mut().extend(values),
    }
    if engine.invocation_stack().is_empty() {
        engine.set_state(VMState::HALT);
    }
    engine.set_jumping();
    Ok(())
}

/// The hash a dynamic call pops must be exactly 20 bytes.
fn pop_script_hash(engine: &mut ExecutionEngine) -> VmResult<UInt160> {
    let bytes = engine.pop_bytes()?;
    UInt160::from_bytes(&bytes).map_err(|_| {
        VmError::invalid_operation_msg(format!("script hash of {} bytes", bytes.len()))
    })
}

/// APPCALL and TAILCALL. An all-zero operand means the hash is on the stack.
fn app_call(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let mut hash = instruction.token_hash(0)?;
    if hash.is_zero() {
        hash = pop_script_hash(engine)?;
    }
    let script = engine.get_script(&hash)?;
    let callee = ExecutionContext::new(script, -1);

    if instruction.opcode() == OpCode::TAILCALL {
        replace_caller(engine, callee, None)
    } else {
        engine.load_context(callee)?;
        enter_callee(engine, instruction, None)
    }
}

/// CALL_E, CALL_ED and their tail forms.
fn call_external(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let opcode = instruction.opcode();
    let rvcount = i32::from(instruction.token_u8(0)?);
    let pcount = usize::from(instruction.token_u8(1)?);
    let tail = matches!(opcode, OpCode::CALL_ET | OpCode::CALL_EDT);

    let context = engine.context()?;
    if context.evaluation_stack().len() < pcount {
        return Err(VmError::stack_underflow_msg(
            pcount,
            context.evaluation_stack().len(),
        ));
    }
    if tail && context.rvcount() != rvcount {
        return Err(VmError::invalid_operation_msg(format!(
            "tail call returns {rvcount} values but caller returns {}",
            context.rvcount()
        )));
    }

    let hash = if matches!(opcode, OpCode::CALL_ED | OpCode::CALL_EDT) {
        pop_script_hash(engine)?
    } else {
        instruction.token_hash(2)?
    };
    let script = engine.get_script(&hash)?;
    let callee = ExecutionContext::new(script, rvcount);

    if tail {
        replace_caller(engine, callee, Some(pcount))
    } else {
        engine.load_context(callee)?;
        enter_callee(engine, instruction, Some(pcount))
    }
}

fn syscall(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let name = instruction.syscall_name();
    let service = Rc::clone(engine.interop_service());
    service.invoke(&name, engine)
}
