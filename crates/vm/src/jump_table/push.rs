//! Push operations for the Neo Virtual Machine.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the push operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::PUSH0, push_0);
    for opcode in OpCode::ALL {
        let value = *opcode as u8;
        if (OpCode::PUSHBYTES1 as u8..=OpCode::PUSHBYTES75 as u8).contains(&value) {
            jump_table.register(*opcode, push_bytes);
        }
        if (OpCode::PUSH1 as u8..=OpCode::PUSH16 as u8).contains(&value) {
            jump_table.register(*opcode, push_n);
        }
    }
    jump_table.register(OpCode::PUSHDATA1, push_bytes);
    jump_table.register(OpCode::PUSHDATA2, push_bytes);
    jump_table.register(OpCode::PUSHDATA4, push_bytes);
    jump_table.register(OpCode::PUSHM1, push_m1);
}

/// PUSH0 pushes an empty byte array.
fn push_0(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from(Vec::<u8>::new()))
}

/// PUSHBYTES1..75 and PUSHDATA1/2/4 push their operand.
fn push_bytes(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from(instruction.operand()))
}

fn push_m1(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from(-1))
}

/// PUSH1..PUSH16 push their number.
fn push_n(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let value = instruction.opcode() as u8 - OpCode::PUSH1 as u8 + 1;
    engine.push(StackItem::from(u32::from(value)))
}

#[cfg(test)]
mod tests {
    use crate::op_code::OpCode;
    use crate::stack_item::StackItem;
    use crate::{ExecutionEngine, VMState};

    fn results(script: &[u8]) -> Vec<StackItem> {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script).unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        engine.result_stack().iter().cloned().collect()
    }

    #[test]
    fn literals() {
        let items = results(&[
            OpCode::PUSH0 as u8,
            OpCode::PUSHM1 as u8,
            OpCode::PUSH16 as u8,
            0x02,
            0xAB,
            0xCD,
            OpCode::PUSHDATA1 as u8,
            0x01,
            0x7F,
        ]);
        assert_eq!(items[0], StackItem::from(Vec::<u8>::new()));
        assert!(matches!(items[0], StackItem::ByteArray(_)));
        assert_eq!(items[1], StackItem::from(-1));
        assert_eq!(items[2], StackItem::from(16));
        assert_eq!(items[3], StackItem::from(vec![0xAB, 0xCD]));
        assert_eq!(items[4], StackItem::from(vec![0x7F]));
    }

    #[test]
    fn truncated_operand_faults() {
        let mut engine = ExecutionEngine::new();
        engine.load_script(&[0x05, 0x01][..]).unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
    }
}
