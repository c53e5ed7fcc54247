//! Structural limits checked before every instruction.
//!
//! Each check looks at the instruction about to run and the stacks as they
//! are, and rejects the instruction if its result would break a limit.

use crate::snapshot::Snapshot;
use neo_config::VmLimits;
use neo_vm::{ExecutionEngine, Instruction, OpCode, StackItem, VmError, VmResult};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::HashSet;

/// PUSHDATA4 payloads and CAT results are bounded by the max item size.
pub fn check_item_size(
    engine: &ExecutionEngine,
    instruction: &Instruction,
    limits: &VmLimits,
) -> VmResult<()> {
    let length = match instruction.opcode() {
        OpCode::PUSHDATA4 => instruction.operand().len(),
        OpCode::CAT => engine.peek(0)?.as_bytes()?.len() + engine.peek(1)?.as_bytes()?.len(),
        _ => return Ok(()),
    };
    if length > limits.max_item_size {
        return Err(VmError::limit_exceeded("item size"));
    }
    Ok(())
}

/// Collections built or grown by the instruction stay within the max array size.
pub fn check_array_size(
    engine: &ExecutionEngine,
    instruction: &Instruction,
    limits: &VmLimits,
) -> VmResult<()> {
    let max = limits.max_array_size;
    match instruction.opcode() {
        OpCode::PACK | OpCode::NEWARRAY | OpCode::NEWSTRUCT => {
            let size = match engine.peek(0)? {
                StackItem::Array(list) | StackItem::Struct(list) => {
                    BigInt::from(list.borrow().len())
                }
                other => other.as_int()?,
            };
            if size > BigInt::from(max) {
                return Err(VmError::limit_exceeded("array size"));
            }
        }
        OpCode::SETITEM => {
            let StackItem::Map(map) = engine.peek(2)? else {
                return Ok(());
            };
            let key = engine.peek(1)?;
            if key.is_collection() {
                return Err(VmError::invalid_type("map key", key.stack_item_type()));
            }
            let map = map.borrow();
            if !map.contains_key(key)? && map.len() >= max {
                return Err(VmError::limit_exceeded("array size"));
            }
        }
        OpCode::APPEND => {
            let list = engine.peek(1)?.as_array()?;
            if list.borrow().len() >= max {
                return Err(VmError::limit_exceeded("array size"));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Calls that push a frame need room on the invocation stack.
pub fn check_invocation_stack(
    engine: &ExecutionEngine,
    instruction: &Instruction,
    limits: &VmLimits,
) -> VmResult<()> {
    match instruction.opcode() {
        OpCode::CALL | OpCode::APPCALL | OpCode::CALL_I | OpCode::CALL_E | OpCode::CALL_ED => {
            if engine.invocation_stack().len() >= limits.max_invocation_stack_size {
                return Err(VmError::limit_exceeded("invocation stack"));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_big_integer(value: &BigInt, limits: &VmLimits) -> VmResult<()> {
    if value.to_signed_bytes_le().len() > limits.max_size_for_big_integer {
        return Err(VmError::limit_exceeded("big integer"));
    }
    Ok(())
}

/// Arithmetic operands and results stay within the big integer size.
pub fn check_big_integers(
    engine: &ExecutionEngine,
    instruction: &Instruction,
    limits: &VmLimits,
) -> VmResult<()> {
    let opcode = instruction.opcode();
    match opcode {
        OpCode::SHL | OpCode::SHR => {
            let shift = engine.peek(0)?.as_int()?;
            let shift = shift
                .to_i64()
                .filter(|s| (limits.min_shl_shr..=limits.max_shl_shr).contains(s))
                .ok_or_else(|| VmError::limit_exceeded("shift"))?;
            let x = engine.peek(1)?.as_int()?;
            let left = if opcode == OpCode::SHL { shift } else { -shift };
            let amount = left.unsigned_abs() as usize;
            let result = if left >= 0 { x << amount } else { x >> amount };
            check_big_integer(&result, limits)
        }
        OpCode::INC | OpCode::DEC => {
            let x = engine.peek(0)?.as_int()?;
            check_big_integer(&x, limits)?;
            let result = if opcode == OpCode::INC { x + 1 } else { x - 1 };
            check_big_integer(&result, limits)
        }
        OpCode::ADD | OpCode::SUB => {
            let x2 = engine.peek(0)?.as_int()?;
            let x1 = engine.peek(1)?.as_int()?;
            check_big_integer(&x2, limits)?;
            check_big_integer(&x1, limits)?;
            let result = if opcode == OpCode::ADD { x1 + x2 } else { x1 - x2 };
            check_big_integer(&result, limits)
        }
        OpCode::MUL => {
            let x2 = engine.peek(0)?.as_int()?;
            let x1 = engine.peek(1)?.as_int()?;
            let length = x1.to_signed_bytes_le().len() + x2.to_signed_bytes_le().len();
            if length > limits.max_size_for_big_integer {
                return Err(VmError::limit_exceeded("big integer"));
            }
            Ok(())
        }
        OpCode::DIV | OpCode::MOD => {
            check_big_integer(&engine.peek(0)?.as_int()?, limits)?;
            check_big_integer(&engine.peek(1)?.as_int()?, limits)
        }
        _ => Ok(()),
    }
}

/// Calls whose target is computed at run time are only allowed from
/// contracts deployed with dynamic invoke.
pub fn check_dynamic_invoke(
    engine: &ExecutionEngine,
    instruction: &Instruction,
    snapshot: &dyn Snapshot,
) -> VmResult<()> {
    let dynamic = match instruction.opcode() {
        OpCode::APPCALL | OpCode::TAILCALL => instruction.operand().iter().all(|b| *b == 0),
        OpCode::CALL_ED | OpCode::CALL_EDT => true,
        _ => false,
    };
    if !dynamic {
        return Ok(());
    }
    let current = engine.current_script_hash()?;
    match snapshot.contract(&current) {
        Some(contract) if contract.has_dynamic_invoke() => Ok(()),
        _ => Err(VmError::DynamicInvokeDenied(current.to_string())),
    }
}

/// How an instruction changes the total item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackDelta {
    Grow(usize),
    Shrink(usize),
    /// The effect depends on data the instruction produces.
    Unknown,
}

/// The delta and whether it is exact.
fn stack_effect(engine: &ExecutionEngine, instruction: &Instruction) -> VmResult<(StackDelta, bool)> {
    use StackDelta::*;

    let opcode = instruction.opcode();
    if opcode as u8 <= OpCode::PUSH16 as u8 {
        return Ok((Grow(1), true));
    }
    Ok(match opcode {
        OpCode::DUPFROMALTSTACK
        | OpCode::DEPTH
        | OpCode::DUP
        | OpCode::OVER
        | OpCode::TUCK
        | OpCode::NEWMAP => (Grow(1), true),
        OpCode::UNPACK => match engine.peek(0)? {
            StackItem::Array(list) | StackItem::Struct(list) => (Grow(list.borrow().len()), true),
            other => return Err(VmError::invalid_type("Array", other.stack_item_type())),
        },
        OpCode::NEWARRAY | OpCode::NEWSTRUCT => match engine.peek(0)? {
            StackItem::Array(list) | StackItem::Struct(list) => {
                (Grow(list.borrow().len()), false)
            }
            other => (Grow(other.as_int()?.to_usize().unwrap_or(0)), true),
        },
        OpCode::KEYS => match engine.peek(0)? {
            StackItem::Map(map) => (Grow(map.borrow().len()), false),
            StackItem::Array(list) | StackItem::Struct(list) => {
                (Grow(list.borrow().len()), false)
            }
            _ => (Grow(0), false),
        },
        OpCode::JMPIF
        | OpCode::JMPIFNOT
        | OpCode::DROP
        | OpCode::NIP
        | OpCode::EQUAL
        | OpCode::BOOLAND
        | OpCode::BOOLOR
        | OpCode::CHECKMULTISIG
        | OpCode::REVERSE
        | OpCode::HASKEY
        | OpCode::THROWIFNOT
        | OpCode::CALL_EDT => (Shrink(1), false),
        OpCode::XSWAP
        | OpCode::ROLL
        | OpCode::CAT
        | OpCode::LEFT
        | OpCode::RIGHT
        | OpCode::AND
        | OpCode::OR
        | OpCode::XOR
        | OpCode::ADD
        | OpCode::SUB
        | OpCode::MUL
        | OpCode::DIV
        | OpCode::MOD
        | OpCode::SHL
        | OpCode::SHR
        | OpCode::NUMEQUAL
        | OpCode::NUMNOTEQUAL
        | OpCode::LT
        | OpCode::GT
        | OpCode::LTE
        | OpCode::GTE
        | OpCode::MIN
        | OpCode::MAX
        | OpCode::CHECKSIG
        | OpCode::CALL_ED => (Shrink(1), true),
        OpCode::RET
        | OpCode::APPCALL
        | OpCode::TAILCALL
        | OpCode::CALL_E
        | OpCode::CALL_ET
        | OpCode::NOT
        | OpCode::ARRAYSIZE => (Grow(0), false),
        OpCode::SYSCALL
        | OpCode::PICKITEM
        | OpCode::SETITEM
        | OpCode::APPEND
        | OpCode::VALUES => (Unknown, false),
        OpCode::XDROP | OpCode::REMOVE => (Shrink(2), false),
        OpCode::SUBSTR | OpCode::WITHIN | OpCode::VERIFY => (Shrink(2), true),
        _ => (Grow(0), true),
    })
}

/// Counts every item reachable from every evaluation and alt stack.
/// Shared collections count once; map keys are not counted.
pub fn count_stack_items(engine: &ExecutionEngine) -> usize {
    let mut pending: Vec<StackItem> = engine
        .invocation_stack()
        .iter()
        .flat_map(|context| {
            context
                .evaluation_stack()
                .iter()
                .chain(context.alt_stack().iter())
                .cloned()
        })
        .collect();
    let mut counted = HashSet::new();
    let mut count = 0;
    while let Some(item) = pending.pop() {
        count += 1;
        match &item {
            StackItem::Array(list) | StackItem::Struct(list) => {
                if counted.insert(std::rc::Rc::as_ptr(list) as usize) {
                    pending.extend(list.borrow().iter().cloned());
                }
            }
            StackItem::Map(map) => {
                if counted.insert(std::rc::Rc::as_ptr(map) as usize) {
                    pending.extend(map.borrow().values().cloned());
                }
            }
            _ => {}
        }
    }
    count
}

/// Keeps a running estimate of the item count and only walks the stacks when
/// the estimate is over the limit and known to be inexact.
///
/// The estimate never undercounts: deltas that cannot be known up front are
/// either rounded up or resolved by a full count before the next instruction.
#[derive(Debug, Clone)]
pub struct StackSizeTracker {
    count: usize,
    strict: bool,
    recount_pending: bool,
}

impl Default for StackSizeTracker {
    fn default() -> Self {
        Self {
            count: 0,
            strict: true,
            recount_pending: true,
        }
    }
}

impl StackSizeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated item count after the last checked instruction.
    pub fn count(&self) -> usize {
        self.count
    }

    /// No rounded delta has been applied since the last full count.
    pub fn is_strict(&self) -> bool {
        self.strict && !self.recount_pending
    }

    /// The last instruction had an effect that is only known after it ran;
    /// the next check starts from a full count.
    pub fn is_recount_pending(&self) -> bool {
        self.recount_pending
    }

    pub fn check(
        &mut self,
        engine: &ExecutionEngine,
        instruction: &Instruction,
        limits: &VmLimits,
    ) -> VmResult<()> {
        let max = limits.max_stack_size;
        if self.recount_pending {
            self.count = count_stack_items(engine);
            self.strict = true;
            self.recount_pending = false;
        }

        let (delta, strict) = stack_effect(engine, instruction)?;
        self.strict &= strict;
        let growth = match delta {
            StackDelta::Grow(n) => {
                self.count = self.count.saturating_add(n);
                n
            }
            StackDelta::Shrink(n) => {
                self.count = self.count.saturating_sub(n);
                0
            }
            StackDelta::Unknown => {
                self.recount_pending = true;
                0
            }
        };
        if self.count <= max {
            return Ok(());
        }
        if self.strict {
            return Err(VmError::limit_exceeded("stack size"));
        }
        self.count = count_stack_items(engine).saturating_add(growth);
        if self.count > max {
            return Err(VmError::limit_exceeded("stack size"));
        }
        self.strict = true;
        Ok(())
    }
}
