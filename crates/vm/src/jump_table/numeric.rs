//! Numeric operations for the Neo Virtual Machine.
//!
//! Operands are converted to arbitrary precision integers. Division and
//! remainder truncate toward zero. Comparison results are booleans.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

/// Registers the numeric operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INC, inc);
    jump_table.register(OpCode::DEC, dec);
    jump_table.register(OpCode::SIGN, sign);
    jump_table.register(OpCode::NEGATE, negate);
    jump_table.register(OpCode::ABS, abs);
    jump_table.register(OpCode::NOT, not);
    jump_table.register(OpCode::NZ, nz);
    jump_table.register(OpCode::ADD, add);
    jump_table.register(OpCode::SUB, sub);
    jump_table.register(OpCode::MUL, mul);
    jump_table.register(OpCode::DIV, div);
    jump_table.register(OpCode::MOD, modulo);
    jump_table.register(OpCode::SHL, shl);
    jump_table.register(OpCode::SHR, shr);
    jump_table.register(OpCode::BOOLAND, booland);
    jump_table.register(OpCode::BOOLOR, boolor);
    jump_table.register(OpCode::NUMEQUAL, numequal);
    jump_table.register(OpCode::NUMNOTEQUAL, numnotequal);
    jump_table.register(OpCode::LT, lt);
    jump_table.register(OpCode::GT, gt);
    jump_table.register(OpCode::LTE, lte);
    jump_table.register(OpCode::GTE, gte);
    jump_table.register(OpCode::MIN, min);
    jump_table.register(OpCode::MAX, max);
    jump_table.register(OpCode::WITHIN, within);
}

fn unary(engine: &mut ExecutionEngine, op: impl FnOnce(BigInt) -> StackItem) -> VmResult<()> {
    let x = engine.pop_int()?;
    engine.push(op(x))
}

fn binary(
    engine: &mut ExecutionEngine,
    op: impl FnOnce(BigInt, BigInt) -> VmResult<StackItem>,
) -> VmResult<()> {
    let x2 = engine.pop_int()?;
    let x1 = engine.pop_int()?;
    let result = op(x1, x2)?;
    engine.push(result)
}

fn inc(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| StackItem::from(x + 1))
}

fn dec(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| StackItem::from(x - 1))
}

fn sign(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| {
        StackItem::from(match x.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        })
    })
}

fn negate(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| StackItem::from(-x))
}

fn abs(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| StackItem::from(x.abs()))
}

fn not(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bool()?;
    engine.push(StackItem::from(!x))
}

fn nz(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| StackItem::from(!x.is_zero()))
}

fn add(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 + x2)))
}

fn sub(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 - x2)))
}

fn mul(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 * x2)))
}

fn div(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| {
        if x2.is_zero() {
            return Err(VmError::DivisionByZero);
        }
        Ok(StackItem::from(x1 / x2))
    })
}

fn modulo(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| {
        if x2.is_zero() {
            return Err(VmError::DivisionByZero);
        }
        Ok(StackItem::from(x1 % x2))
    })
}

/// Pops a shift amount and checks it against the configured range.
/// Returns `None` for a zero shift, which leaves the operand untouched.
fn pop_shift(engine: &mut ExecutionEngine) -> VmResult<Option<i64>> {
    let shift = engine.pop_int()?;
    let limits = engine.limits();
    let shift = shift
        .to_i64()
        .filter(|s| (limits.min_shl_shr..=limits.max_shl_shr).contains(s))
        .ok_or_else(|| VmError::limit_exceeded("shift"))?;
    Ok((shift != 0).then_some(shift))
}

/// Shifts left for positive amounts and right (flooring) for negative ones.
fn shift_left(x: BigInt, shift: i64) -> BigInt {
    let amount = shift.unsigned_abs() as usize;
    if shift >= 0 {
        x << amount
    } else {
        x >> amount
    }
}

fn shl(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let Some(shift) = pop_shift(engine)? else {
        return Ok(());
    };
    unary(engine, |x| StackItem::from(shift_left(x, shift)))
}

fn shr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let Some(shift) = pop_shift(engine)? else {
        return Ok(());
    };
    unary(engine, |x| StackItem::from(shift_left(x, -shift)))
}

fn booland(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_bool()?;
    let x1 = engine.pop_bool()?;
    engine.push(StackItem::from(x1 && x2))
}

fn boolor(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_bool()?;
    let x1 = engine.pop_bool()?;
    engine.push(StackItem::from(x1 || x2))
}

fn numequal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 == x2)))
}

fn numnotequal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 != x2)))
}

fn lt(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 < x2)))
}

fn gt(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 > x2)))
}

fn lte(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 <= x2)))
}

fn gte(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1 >= x2)))
}

fn min(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1.min(x2))))
}

fn max(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |x1, x2| Ok(StackItem::from(x1.max(x2))))
}

/// Pushes `a <= x < b`.
fn within(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let b = engine.pop_int()?;
    let a = engine.pop_int()?;
    let x = engine.pop_int()?;
    engine.push(StackItem::from(a <= x && x < b))
}

#[cfg(test)]
mod tests {
    use crate::error::VmError;
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

    #[test]
    fn truncating_division() {
        // 7 / -2 and 7 % -2
        let seven_neg_two = [0x57, 0x01, 0xFE];
        assert_eq!(
            top(&[&seven_neg_two[..], &[OpCode::DIV as u8]].concat()),
            StackItem::from(-3)
        );
        assert_eq!(
            top(&[&seven_neg_two[..], &[OpCode::MOD as u8]].concat()),
            StackItem::from(1)
        );
        assert_eq!(
            top(&[0x01, 0xF9, 0x52, OpCode::MOD as u8]),
            StackItem::from(-1)
        );
    }

    #[test]
    fn division_by_zero_faults() {
        let engine = run(&[0x51, 0x00, OpCode::DIV as u8]);
        assert_eq!(engine.state(), VMState::FAULT);
        assert_eq!(engine.fault_reason(), Some(&VmError::DivisionByZero));
    }

    #[test]
    fn shifts() {
        assert_eq!(top(&[0x51, 0x58, OpCode::SHL as u8]), StackItem::from(256));
        assert_eq!(top(&[0x01, 0xF0, 0x52, OpCode::SHR as u8]), StackItem::from(-4));
        assert_eq!(
            top(&[0x51, OpCode::PUSHM1 as u8, OpCode::SHR as u8]),
            StackItem::from(2)
        );
        // A zero shift leaves the operand as it was, even a byte array.
        assert_eq!(
            top(&[0x01, 0x05, 0x00, OpCode::SHL as u8]),
            StackItem::ByteArray(vec![0x05].into())
        );
        let out_of_range = run(&[0x51, 0x02, 0x01, 0x01, OpCode::SHL as u8]);
        assert_eq!(out_of_range.state(), VMState::FAULT);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(top(&[0x52, 0x53, OpCode::LT as u8]), StackItem::from(true));
        assert_eq!(top(&[0x53, 0x53, OpCode::GTE as u8]), StackItem::from(true));
        assert_eq!(top(&[0x52, 0x53, OpCode::MAX as u8]), StackItem::from(3));
        assert_eq!(
            top(&[0x00, 0x51, OpCode::BOOLOR as u8]),
            StackItem::from(true)
        );
        assert_eq!(top(&[0x00, OpCode::NOT as u8]), StackItem::from(true));
        assert_eq!(top(&[OpCode::PUSHM1 as u8, OpCode::SIGN as u8]), StackItem::from(-1));
        assert_eq!(top(&[OpCode::PUSHM1 as u8, OpCode::ABS as u8]), StackItem::from(1));
    }

    #[test]
    fn within_is_half_open() {
        assert_eq!(top(&[0x52, 0x52, 0x55, OpCode::WITHIN as u8]), StackItem::from(true));
        assert_eq!(top(&[0x55, 0x52, 0x55, OpCode::WITHIN as u8]), StackItem::from(false));
    }
}
