//! Gas metering for the application engine.
//!
//! Prices are in gas units; the meter multiplies them by the gas ratio before
//! debiting. The price table is part of consensus and must not change.

use crate::contract_state::ContractPropertyState;
use neo_config::{GasSettings, GAS_FACTOR};
use neo_vm::{ExecutionEngine, Instruction, OpCode, StackItem, VmError, VmResult};
use num_traits::ToPrimitive;

/// Tracks gas consumed against the prepaid budget.
#[derive(Debug, Clone)]
pub struct GasMeter {
    consumed: i64,
    budget: i64,
    ratio: i64,
    test_mode: bool,
    max_free_ops: u64,
    free_ops: u64,
}

impl GasMeter {
    /// `gas` is the prepaid amount on top of the free allowance.
    pub fn new(gas: i64, test_mode: bool, settings: &GasSettings) -> Self {
        Self {
            consumed: 0,
            budget: settings.free.saturating_add(gas),
            ratio: settings.ratio,
            test_mode,
            max_free_ops: settings.max_free_ops,
            free_ops: 0,
        }
    }

    pub fn consumed(&self) -> i64 {
        self.consumed
    }

    pub fn budget(&self) -> i64 {
        self.budget
    }

    pub fn ratio(&self) -> i64 {
        self.ratio
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Debits `price × ratio`. Test mode ignores the budget but caps the
    /// number of charged instructions.
    pub fn charge(&mut self, price: i64) -> VmResult<()> {
        self.consumed = price
            .checked_mul(self.ratio)
            .and_then(|amount| self.consumed.checked_add(amount))
            .ok_or_else(|| VmError::limit_exceeded("gas arithmetic"))?;
        if self.test_mode {
            self.free_ops += 1;
            if self.free_ops > self.max_free_ops {
                return Err(VmError::limit_exceeded("free operations"));
            }
            return Ok(());
        }
        if self.consumed > self.budget {
            return Err(VmError::OutOfGas {
                consumed: self.consumed,
                available: self.budget,
            });
        }
        Ok(())
    }
}

/// Price of the instruction about to run.
pub fn get_price(engine: &ExecutionEngine, instruction: &Instruction, ratio: i64) -> VmResult<i64> {
    let opcode = instruction.opcode();
    if opcode as u8 <= OpCode::NOP as u8 {
        return Ok(0);
    }
    Ok(match opcode {
        OpCode::APPCALL | OpCode::TAILCALL => 10,
        OpCode::SYSCALL => get_price_for_syscall(engine, &instruction.syscall_name(), ratio)?,
        OpCode::SHA1 | OpCode::SHA256 => 10,
        OpCode::HASH160 | OpCode::HASH256 => 20,
        OpCode::CHECKSIG | OpCode::VERIFY => 100,
        OpCode::CHECKMULTISIG => {
            let Ok(item) = engine.peek(0) else {
                return Ok(1);
            };
            let n = match item {
                StackItem::Array(list) | StackItem::Struct(list) => list.borrow().len() as i64,
                other => other
                    .as_int()?
                    .to_i32()
                    .ok_or_else(|| VmError::invalid_operation_msg("key count out of range"))?
                    as i64,
            };
            if n < 1 {
                1
            } else {
                100 * n
            }
        }
        _ => 1,
    })
}

/// Syscall prices. Deployment and registration calls are priced here even
/// though this engine does not serve them, so scripts using them are charged
/// before they fault.
pub fn get_price_for_syscall(engine: &ExecutionEngine, name: &str, ratio: i64) -> VmResult<i64> {
    let gas = |amount: i64| amount * GAS_FACTOR / ratio;
    match name {
        "Neo.Asset.Create" | "AntShares.Asset.Create" => Ok(gas(5000)),
        "Neo.Asset.Renew" | "AntShares.Asset.Renew" => {
            let years = peek_u8(engine, 1)?;
            Ok(i64::from(years) * gas(5000))
        }
        "Neo.Contract.Create"
        | "Neo.Contract.Migrate"
        | "AntShares.Contract.Create"
        | "AntShares.Contract.Migrate" => {
            let properties = ContractPropertyState::from_bits_truncate(peek_u8(engine, 3)?);
            let mut fee = 100;
            if properties.contains(ContractPropertyState::HAS_STORAGE) {
                fee += 400;
            }
            if properties.contains(ContractPropertyState::HAS_DYNAMIC_INVOKE) {
                fee += 500;
            }
            Ok(gas(fee))
        }
        "Neo.Validator.Register" | "AntShares.Validator.Register" => Ok(gas(1000)),
        _ => Ok(engine.interop_service().get_price(name, engine)?.unwrap_or(1)),
    }
}

fn peek_u8(engine: &ExecutionEngine, index: usize) -> VmResult<u8> {
    engine
        .peek(index)?
        .as_int()?
        .to_u8()
        .ok_or_else(|| VmError::invalid_operation_msg("byte argument out of range"))
}

/// `Storage.Put` is charged per started kilobyte of key plus value.
pub fn storage_put_price(engine: &ExecutionEngine) -> VmResult<i64> {
    let key = engine.peek(1)?.as_bytes()?.len() as i64;
    let value = engine.peek(2)?.as_bytes()?.len() as i64;
    Ok(((key + value - 1) / 1024 + 1) * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_config::GAS_RATIO;
    use neo_vm::ScriptBuilder;

    fn first_instruction(script: Vec<u8>) -> (ExecutionEngine, Instruction) {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script).unwrap();
        let instruction = engine.current_context().unwrap().current_instruction().unwrap();
        (engine, (*instruction).clone())
    }

    fn price_of(script: Vec<u8>) -> i64 {
        let (engine, instruction) = first_instruction(script);
        get_price(&engine, &instruction, GAS_RATIO).unwrap()
    }

    #[test]
    fn opcode_prices() {
        assert_eq!(price_of(vec![0x51]), 0);
        assert_eq!(price_of(vec![OpCode::NOP as u8]), 0);
        assert_eq!(price_of(vec![OpCode::ADD as u8]), 1);
        assert_eq!(price_of(vec![OpCode::SHA256 as u8]), 10);
        assert_eq!(price_of(vec![OpCode::HASH160 as u8]), 20);
        assert_eq!(price_of(vec![OpCode::VERIFY as u8]), 100);
        let mut app_call = vec![OpCode::APPCALL as u8];
        app_call.extend_from_slice(&[0; 20]);
        assert_eq!(price_of(app_call), 10);
        // Empty stack.
        assert_eq!(price_of(vec![OpCode::CHECKMULTISIG as u8]), 1);
    }

    #[test]
    fn checkmultisig_scales_with_key_count() {
        let mut engine = ExecutionEngine::new();
        engine.load_script(vec![OpCode::CHECKMULTISIG as u8]).unwrap();
        let instruction = engine.current_context().unwrap().current_instruction().unwrap();
        engine.push(StackItem::from(3)).unwrap();
        assert_eq!(get_price(&engine, &instruction, GAS_RATIO).unwrap(), 300);
        engine.push(StackItem::new_array(vec![StackItem::from(0); 5])).unwrap();
        assert_eq!(get_price(&engine, &instruction, GAS_RATIO).unwrap(), 500);
        engine.push(StackItem::from(0)).unwrap();
        assert_eq!(get_price(&engine, &instruction, GAS_RATIO).unwrap(), 1);
    }

    #[test]
    fn deployment_prices() {
        let mut sb = ScriptBuilder::new();
        sb.emit_syscall("Neo.Contract.Create").unwrap();
        let (mut engine, instruction) = first_instruction(sb.to_array());
        for item in [3, 0, 0, 0] {
            engine.push(StackItem::from(item)).unwrap();
        }
        // HAS_STORAGE | HAS_DYNAMIC_INVOKE
        assert_eq!(
            get_price(&engine, &instruction, GAS_RATIO).unwrap(),
            1000 * GAS_FACTOR / GAS_RATIO
        );
        assert_eq!(
            get_price_for_syscall(&engine, "Neo.Asset.Create", GAS_RATIO).unwrap(),
            5_000_000
        );
        assert_eq!(
            get_price_for_syscall(&engine, "Neo.Unknown", GAS_RATIO).unwrap(),
            1
        );
    }

    #[test]
    fn storage_put_rounds_up_per_kilobyte() {
        let mut engine = ExecutionEngine::new();
        engine.load_script(vec![0x61]).unwrap();
        engine.push(StackItem::from(vec![0u8; 1000])).unwrap();
        engine.push(StackItem::from(vec![0u8; 24])).unwrap();
        engine.push(StackItem::from(0)).unwrap();
        assert_eq!(storage_put_price(&engine).unwrap(), 1000);
        engine.pop().unwrap();
        engine.pop().unwrap();
        engine.push(StackItem::from(vec![0u8; 25])).unwrap();
        engine.push(StackItem::from(0)).unwrap();
        assert_eq!(storage_put_price(&engine).unwrap(), 2000);
    }

    #[test]
    fn meter_budget_and_test_mode() {
        let settings = GasSettings {
            ratio: 10,
            free: 0,
            max_free_ops: 2,
        };
        let mut meter = GasMeter::new(25, false, &settings);
        meter.charge(1).unwrap();
        meter.charge(1).unwrap();
        assert!(meter.charge(1).unwrap_err().is_out_of_gas());
        assert_eq!(meter.consumed(), 30);

        let mut meter = GasMeter::new(0, true, &settings);
        meter.charge(100).unwrap();
        meter.charge(100).unwrap();
        assert!(meter.charge(0).is_err());
    }
}
