//! Bitwise operations for the Neo Virtual Machine.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the bitwise operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INVERT, invert);
    jump_table.register(OpCode::AND, and);
    jump_table.register(OpCode::OR, or);
    jump_table.register(OpCode::XOR, xor);
    jump_table.register(OpCode::EQUAL, equal);
}

fn invert(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_int()?;
    engine.push(StackItem::from(!x))
}

fn and(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_int()?;
    let x1 = engine.pop_int()?;
    engine.push(StackItem::from(x1 & x2))
}

fn or(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_int()?;
    let x1 = engine.pop_int()?;
    engine.push(StackItem::from(x1 | x2))
}

fn xor(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_int()?;
    let x1 = engine.pop_int()?;
    engine.push(StackItem::from(x1 ^ x2))
}

fn equal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop()?;
    let x1 = engine.pop()?;
    engine.push(StackItem::from(x1.equals(&x2)))
}

#[cfg(test)]
mod tests {
    use crate::op_code::OpCode;
    use crate::stack_item::StackItem;
    use crate::{ExecutionEngine, VMState};

    fn top(script: &[u8]) -> StackItem {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script).unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        engine.result_stack().peek(0).unwrap().clone()
    }

    #[test]
    fn twos_complement_logic() {
        assert_eq!(top(&[0x55, OpCode::INVERT as u8]), StackItem::from(-6));
        assert_eq!(top(&[0x5C, 0x5A, OpCode::AND as u8]), StackItem::from(8));
        assert_eq!(top(&[0x5C, 0x5A, OpCode::OR as u8]), StackItem::from(14));
        assert_eq!(top(&[0x5C, 0x5A, OpCode::XOR as u8]), StackItem::from(6));
        assert_eq!(
            top(&[OpCode::PUSHM1 as u8, 0x5A, OpCode::AND as u8]),
            StackItem::from(10)
        );
    }

    #[test]
    fn equal_compares_bytes_across_types() {
        // 1 and the byte array [0x01] have the same encoding.
        assert_eq!(top(&[0x51, 0x01, 0x01, OpCode::EQUAL as u8]), StackItem::from(true));
        assert_eq!(top(&[0x51, 0x52, OpCode::EQUAL as u8]), StackItem::from(false));
        // Two fresh maps are different references.
        assert_eq!(
            top(&[OpCode::NEWMAP as u8, OpCode::NEWMAP as u8, OpCode::EQUAL as u8]),
            StackItem::from(false)
        );
        assert_eq!(
            top(&[OpCode::NEWMAP as u8, OpCode::DUP as u8, OpCode::EQUAL as u8]),
            StackItem::from(true)
        );
    }
}
