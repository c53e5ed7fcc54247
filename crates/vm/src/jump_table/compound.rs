//! Compound operations for the Neo Virtual Machine.
//!
//! Arrays and maps are shared by reference; structs are copied whenever they
//! are stored into another collection.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{to_count, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Registers the compound operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::ARRAYSIZE, array_size);
    jump_table.register(OpCode::PACK, pack);
    jump_table.register(OpCode::UNPACK, unpack);
    jump_table.register(OpCode::PICKITEM, pick_item);
    jump_table.register(OpCode::SETITEM, set_item);
    jump_table.register(OpCode::NEWARRAY, new_array);
    jump_table.register(OpCode::NEWSTRUCT, new_array);
    jump_table.register(OpCode::NEWMAP, new_map);
    jump_table.register(OpCode::APPEND, append);
    jump_table.register(OpCode::REVERSE, reverse);
    jump_table.register(OpCode::REMOVE, remove);
    jump_table.register(OpCode::HASKEY, has_key);
    jump_table.register(OpCode::KEYS, keys);
    jump_table.register(OpCode::VALUES, values);
}

fn normalize_index(index: &BigInt, length: usize) -> VmResult<usize> {
    index
        .to_usize()
        .filter(|i| *i < length)
        .ok_or_else(|| {
            VmError::invalid_operation_msg(format!("index {index} out of range [0, {length})"))
        })
}

/// Pops a key, rejecting collections.
fn pop_key(engine: &mut ExecutionEngine) -> VmResult<StackItem> {
    let key = engine.pop()?;
    if key.is_collection() {
        return Err(VmError::invalid_type("primitive key", key.stack_item_type()));
    }
    Ok(key)
}

/// Element count for collections, byte length otherwise.
fn array_size(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.pop()?;
    let size = match &item {
        StackItem::Array(list) | StackItem::Struct(list) => list.borrow().len(),
        StackItem::Map(map) => map.borrow().len(),
        other => other.as_bytes()?.len(),
    };
    engine.push(StackItem::from(size))
}

/// Pops `n` and then `n` items; the first one popped becomes element 0.
/// The count is validated before anything is popped.
fn pack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let stack = engine.context_mut()?.evaluation_stack_mut();
    let size = stack.peek(0)?.as_int()?;
    let available = stack.len() - 1;
    let size = size
        .to_usize()
        .filter(|size| *size <= available)
        .ok_or_else(|| {
            VmError::invalid_operation_msg(format!("PACK {size} with {available} items"))
        })?;
    stack.pop()?;
    let mut items = stack.take_top(size)?;
    items.reverse();
    engine.push(StackItem::new_array(items))
}

/// Pushes the elements last to first, then the count.
fn unpack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.pop()?;
    let items: Vec<StackItem> = item.as_array()?.borrow().iter().cloned().collect();
    let count = items.len();
    let stack = engine.context_mut()?.evaluation_stack_mut();
    stack.extend(items.into_iter().rev());
    stack.push(StackItem::from(count));
    Ok(())
}

fn pick_item(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let collection = engine.pop()?;
    let item = match &collection {
        StackItem::Array(list) | StackItem::Struct(list) => {
            let list = list.borrow();
            let index = normalize_index(&key.as_int()?, list.len())?;
            list[index].clone()
        }
        StackItem::Map(map) => map
            .borrow()
            .get(&key)?
            .cloned()
            .ok_or_else(|| VmError::invalid_operation_msg("key not found in map"))?,
        other => {
            return Err(VmError::invalid_type("Array or Map", other.stack_item_type()))
        }
    };
    engine.push(item)
}

fn set_item(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let value = engine.pop()?.clone_for_store();
    let key = pop_key(engine)?;
    let target = engine.pop()?;
    match &target {
        StackItem::Array(list) | StackItem::Struct(list) => {
            let mut list = list.borrow_mut();
            let index = normalize_index(&key.as_int()?, list.len())?;
            list[index] = value.clone();
        }
        StackItem::Map(map) => {
            map.borrow_mut().insert(key, value.clone())?;
        }
        other => {
            return Err(VmError::invalid_type("Array or Map", other.stack_item_type()))
        }
    }
    engine.cycle_tracker_mut().track(&target, &value);
    Ok(())
}

/// NEWARRAY and NEWSTRUCT. A count creates that many `false` elements; a
/// collection is converted, sharing its elements.
fn new_array(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let make_struct = instruction.opcode() == OpCode::NEWSTRUCT;
    let item = engine.pop()?;
    let result = match item {
        StackItem::Array(_) if !make_struct => item,
        StackItem::Struct(_) if make_struct => item,
        StackItem::Array(list) | StackItem::Struct(list) => {
            let items = list.borrow().to_vec();
            wrap(items, make_struct)
        }
        other => {
            let count = to_count(&other.as_int()?)?;
            if count > engine.limits().max_array_size {
                return Err(VmError::limit_exceeded("array size"));
            }
            wrap(vec![StackItem::from(false); count], make_struct)
        }
    };
    engine.push(result)
}

fn wrap(items: Vec<StackItem>, make_struct: bool) -> StackItem {
    if make_struct {
        StackItem::new_struct(items)
    } else {
        StackItem::new_array(items)
    }
}

fn new_map(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::new_map())
}

fn append(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.pop()?.clone_for_store();
    let target = engine.pop()?;
    target.as_array()?.borrow_mut().push(item.clone());
    engine.cycle_tracker_mut().track(&target, &item);
    Ok(())
}

fn reverse(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let target = engine.pop()?;
    target.as_array()?.borrow_mut().reverse();
    Ok(())
}

fn remove(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let target = engine.pop()?;
    match &target {
        StackItem::Array(list) | StackItem::Struct(list) => {
            let mut list = list.borrow_mut();
            let index = normalize_index(&key.as_int()?, list.len())?;
            list.remove(index);
        }
        StackItem::Map(map) => {
            map.borrow_mut().remove(&key)?;
        }
        other => {
            return Err(VmError::invalid_type("Array or Map", other.stack_item_type()))
        }
    }
    Ok(())
}

fn has_key(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let target = engine.pop()?;
    let found = match &target {
        StackItem::Array(list) | StackItem::Struct(list) => {
            let index = to_count(&key.as_int()?)?;
            index < list.borrow().len()
        }
        StackItem::Map(map) => map.borrow().contains_key(&key)?,
        other => {
            return Err(VmError::invalid_type("Array or Map", other.stack_item_type()))
        }
    };
    engine.push(StackItem::from(found))
}

fn keys(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let target = engine.pop()?;
    let keys: Vec<StackItem> = target.as_map()?.borrow().keys().cloned().collect();
    engine.push(StackItem::new_array(keys))
}

/// A new array of the values; struct values are copied.
fn values(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let target = engine.pop()?;
    let values: Vec<StackItem> = match &target {
        StackItem::Array(list) | StackItem::Struct(list) => {
            list.borrow().iter().map(StackItem::clone_for_store).collect()
        }
        StackItem::Map(map) => map
            .borrow()
            .values()
            .map(StackItem::clone_for_store)
            .collect(),
        other => {
            return Err(VmError::invalid_type("Array or Map", other.stack_item_type()))
        }
    };
    engine.push(StackItem::new_array(values))
}

#[cfg(test)]
mod tests {
    use crate::op_code::OpCode;
    use crate::stack_item::StackItem;
    use crate::{ExecutionEngine, VMState};

    fn run(script: &[u8]) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script).unwrap();
        engine.execute();
        engine
    }

    fn top(script: &[u8]) -> StackItem {
        let engine = run(script);
        assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_reason());
        engine.result_stack().peek(0).unwrap().clone()
    }

    fn ints(item: &StackItem) -> Vec<StackItem> {
        item.as_array().unwrap().borrow().iter().cloned().collect()
    }

    #[test]
    fn pack_orders_from_the_top() {
        let packed = top(&[0x51, 0x52, 0x53, 0x53, OpCode::PACK as u8]);
        assert_eq!(
            ints(&packed),
            vec![StackItem::from(3), StackItem::from(2), StackItem::from(1)]
        );
    }

    #[test]
    fn pack_with_too_few_items_leaves_the_stack() {
        let mut engine = ExecutionEngine::new();
        engine
            .load_script(&[0x51, 0x55, OpCode::PACK as u8][..])
            .unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
        let stack = engine.current_context().unwrap().evaluation_stack();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek(0).unwrap(), &StackItem::from(5));
    }

    #[test]
    fn unpack_reverses_pack() {
        let engine = run(&[0x51, 0x52, 0x52, OpCode::PACK as u8, OpCode::UNPACK as u8]);
        let items: Vec<_> = engine.result_stack().iter().cloned().collect();
        assert_eq!(
            items,
            vec![StackItem::from(1), StackItem::from(2), StackItem::from(2)]
        );
    }

    #[test]
    fn set_and_pick_items() {
        // NEWMAP DUP "k" 5 SETITEM "k" PICKITEM
        let script = [
            OpCode::NEWMAP as u8,
            OpCode::DUP as u8,
            0x01,
            b'k',
            0x55,
            OpCode::SETITEM as u8,
            0x01,
            b'k',
            OpCode::PICKITEM as u8,
        ];
        assert_eq!(top(&script), StackItem::from(5));

        let missing = [OpCode::NEWMAP as u8, 0x01, b'k', OpCode::PICKITEM as u8];
        assert_eq!(run(&missing).state(), VMState::FAULT);

        let out_of_range = [0x52, OpCode::NEWARRAY as u8, 0x52, OpCode::PICKITEM as u8];
        assert_eq!(run(&out_of_range).state(), VMState::FAULT);
    }

    #[test]
    fn collection_keys_fault() {
        let script = [
            OpCode::NEWMAP as u8,
            OpCode::NEWMAP as u8,
            OpCode::HASKEY as u8,
        ];
        assert_eq!(run(&script).state(), VMState::FAULT);
    }

    #[test]
    fn appended_structs_are_copies() {
        // NEWARRAY(0) ; struct = NEWSTRUCT(1) ; keep a copy, append, then mutate the original
        let script = [
            0x00,
            OpCode::NEWARRAY as u8,
            OpCode::DUP as u8,
            0x51,
            OpCode::NEWSTRUCT as u8,
            OpCode::DUP as u8,
            OpCode::TOALTSTACK as u8,
            OpCode::APPEND as u8,
            OpCode::FROMALTSTACK as u8,
            0x00,
            0x55,
            OpCode::SETITEM as u8,
        ];
        let array = top(&script);
        let stored = ints(&array);
        assert_eq!(ints(&stored[0]), vec![StackItem::from(false)]);
    }

    #[test]
    fn new_array_conversions() {
        let array = top(&[0x53, OpCode::NEWARRAY as u8]);
        assert_eq!(ints(&array), vec![StackItem::from(false); 3]);
        let converted = top(&[0x52, OpCode::NEWARRAY as u8, OpCode::NEWSTRUCT as u8]);
        assert!(matches!(converted, StackItem::Struct(_)));
        assert_eq!(ints(&converted).len(), 2);
        let negative = [OpCode::PUSHM1 as u8, OpCode::NEWARRAY as u8];
        assert_eq!(run(&negative).state(), VMState::FAULT);
    }

    #[test]
    fn oversized_counts_fault_without_allocating() {
        // 2^60 NEWARRAY
        let huge = [0x08, 0, 0, 0, 0, 0, 0, 0, 0x10, OpCode::NEWARRAY as u8];
        let engine = run(&huge);
        assert_eq!(engine.state(), VMState::FAULT);
        // 1025 NEWSTRUCT
        let engine = run(&[0x02, 0x01, 0x04, OpCode::NEWSTRUCT as u8]);
        assert_eq!(engine.state(), VMState::FAULT);
        assert_eq!(
            engine.fault_reason().map(ToString::to_string).as_deref(),
            Some("array size limit exceeded")
        );
        assert!(matches!(top(&[0x02, 0x00, 0x04, OpCode::NEWARRAY as u8]), StackItem::Array(_)));
    }

    #[test]
    fn haskey_index_beyond_i32_faults() {
        // [1] HASKEY 2^31
        let script = [0x51, 0x51, OpCode::PACK as u8, 0x05, 0, 0, 0, 0x80, 0, OpCode::HASKEY as u8];
        assert_eq!(run(&script).state(), VMState::FAULT);
        let script = [0x51, 0x51, OpCode::PACK as u8, 0x52, OpCode::HASKEY as u8];
        assert_eq!(top(&script), StackItem::from(false));
    }

    #[test]
    fn keys_values_and_remove() {
        // map = {1: 2, 3: 4}; remove 1; KEYS
        let build = [
            OpCode::NEWMAP as u8,
            OpCode::DUP as u8,
            0x51,
            0x52,
            OpCode::SETITEM as u8,
            OpCode::DUP as u8,
            0x53,
            0x54,
            OpCode::SETITEM as u8,
        ];
        let keys = top(&[&build[..], &[OpCode::DUP as u8, 0x51, OpCode::REMOVE as u8, OpCode::KEYS as u8]].concat());
        assert_eq!(ints(&keys), vec![StackItem::from(3)]);
        let values = top(&[&build[..], &[OpCode::VALUES as u8]].concat());
        assert_eq!(ints(&values), vec![StackItem::from(2), StackItem::from(4)]);
        let size = top(&[&build[..], &[OpCode::ARRAYSIZE as u8]].concat());
        assert_eq!(size, StackItem::from(2));
    }

    #[test]
    fn reverse_in_place() {
        let script = [
            0x51,
            0x52,
            0x52,
            OpCode::PACK as u8,
            OpCode::DUP as u8,
            OpCode::REVERSE as u8,
        ];
        let array = top(&script);
        assert_eq!(ints(&array), vec![StackItem::from(1), StackItem::from(2)]);
    }
}
