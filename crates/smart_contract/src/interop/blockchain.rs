use super::{to_uint160, to_uint256, StateReader};
use crate::ledger::AccountState;
use neo_core::UInt256;
use neo_vm::{ExecutionEngine, InteropInterface, StackItem, VmResult};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::rc::Rc;

/// A block argument is either a height (up to 5 bytes) or a 32-byte hash.
fn resolve_block_hash(reader: &StateReader, argument: &[u8]) -> Option<UInt256> {
    match argument.len() {
        0..=5 => BigInt::from_signed_bytes_le(argument)
            .to_u32()
            .and_then(|index| reader.snapshot().block_hash(index)),
        32 => to_uint256(argument),
        _ => None,
    }
}

pub(super) fn get_height(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    engine.push(StackItem::from(reader.snapshot().height()))?;
    Ok(true)
}

pub(super) fn get_header(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let header = resolve_block_hash(reader, &argument)
        .and_then(|hash| reader.snapshot().header(&hash));
    match header {
        Some(header) => {
            engine.push(StackItem::InteropInterface(header as Rc<dyn InteropInterface>))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(super) fn get_block(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let block = resolve_block_hash(reader, &argument)
        .and_then(|hash| reader.snapshot().block(&hash));
    match block {
        Some(block) => {
            engine.push(StackItem::InteropInterface(block as Rc<dyn InteropInterface>))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(super) fn get_transaction(
    reader: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let found = to_uint256(&argument).and_then(|hash| reader.snapshot().transaction(&hash));
    match found {
        Some((transaction, _)) => {
            engine.push(StackItem::InteropInterface(
                transaction as Rc<dyn InteropInterface>,
            ))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(super) fn get_transaction_height(
    reader: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let found = to_uint256(&argument).and_then(|hash| reader.snapshot().transaction(&hash));
    match found {
        Some((_, height)) => {
            engine.push(StackItem::from(height))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Unknown accounts read as empty ones.
pub(super) fn get_account(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let Some(hash) = to_uint160(&argument) else {
        return Ok(false);
    };
    let account = reader
        .snapshot()
        .account(&hash)
        .unwrap_or_else(|| AccountState::new(hash));
    engine.push(StackItem::from_interface(account))?;
    Ok(true)
}

pub(super) fn get_validators(
    reader: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let validators = reader
        .snapshot()
        .validators()
        .into_iter()
        .map(StackItem::from)
        .collect::<Vec<_>>();
    engine.push(StackItem::from(validators))?;
    Ok(true)
}

pub(super) fn get_asset(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    match to_uint256(&argument).and_then(|hash| reader.snapshot().asset(&hash)) {
        Some(asset) => {
            engine.push(StackItem::from_interface(asset))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Pushes an empty byte array when no contract is deployed at the hash.
pub(super) fn get_contract(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let Some(hash) = to_uint160(&argument) else {
        return Ok(false);
    };
    let item = match reader.snapshot().contract(&hash) {
        Some(contract) => StackItem::InteropInterface(contract as Rc<dyn InteropInterface>),
        None => StackItem::from(Vec::<u8>::new()),
    };
    engine.push(item)?;
    Ok(true)
}
