//! Getters over the ledger handles scripts receive from blockchain calls.

use super::{to_uint256, StateReader};
use crate::contract_state::ContractState;
use crate::ledger::{
    AccountState, AssetState, Block, CoinReference, Header, Transaction, TransactionAttribute,
    TransactionOutput,
};
use neo_vm::{ExecutionEngine, InteropInterface, StackItem, VmResult};
use std::rc::Rc;

/// Pops a handle of type `T` and pushes what `read` extracts from it.
/// A handle of any other type fails the call.
fn read_handle<T: InteropInterface>(
    engine: &mut ExecutionEngine,
    read: impl FnOnce(&T) -> StackItem,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(handle) = item.as_interface::<T>() else {
        return Ok(false);
    };
    let value = read(handle);
    engine.push(value)?;
    Ok(true)
}

/// Blocks answer header queries too.
fn read_header(
    engine: &mut ExecutionEngine,
    read: impl FnOnce(&Header) -> StackItem,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let header = match item.as_interface::<Header>() {
        Ok(header) => header,
        Err(_) => match item.as_interface::<Block>() {
            Ok(block) => &block.header,
            Err(_) => return Ok(false),
        },
    };
    let value = read(header);
    engine.push(value)?;
    Ok(true)
}

/// Pushes `items` as an array unless it would be oversized.
fn push_list(engine: &mut ExecutionEngine, items: Vec<StackItem>) -> VmResult<bool> {
    if items.len() > engine.limits().max_array_size {
        return Ok(false);
    }
    engine.push(StackItem::from(items))?;
    Ok(true)
}

fn handles<T: InteropInterface + Clone>(values: &[T]) -> Vec<StackItem> {
    values
        .iter()
        .cloned()
        .map(StackItem::from_interface)
        .collect()
}

pub(super) fn header_get_index(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.index))
}

pub(super) fn header_get_hash(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.hash().to_vec()))
}

pub(super) fn header_get_version(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.version))
}

pub(super) fn header_get_prev_hash(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.prev_hash.to_vec()))
}

pub(super) fn header_get_merkle_root(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.merkle_root.to_vec()))
}

pub(super) fn header_get_timestamp(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.timestamp))
}

pub(super) fn header_get_consensus_data(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.consensus_data))
}

pub(super) fn header_get_next_consensus(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_header(engine, |header| StackItem::from(header.next_consensus.to_vec()))
}

pub(super) fn block_get_transaction_count(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |block: &Block| StackItem::from(block.transactions.len()))
}

pub(super) fn block_get_transactions(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(block) = item.as_interface::<Block>() else {
        return Ok(false);
    };
    let transactions = block
        .transactions
        .iter()
        .map(|tx| StackItem::InteropInterface(Rc::clone(tx) as Rc<dyn InteropInterface>))
        .collect();
    push_list(engine, transactions)
}

/// Pops the block, then the index.
pub(super) fn block_get_transaction(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let index = engine.pop_int()?;
    let Ok(block) = item.as_interface::<Block>() else {
        return Ok(false);
    };
    let transaction = usize::try_from(index)
        .ok()
        .and_then(|index| block.transactions.get(index));
    match transaction {
        Some(tx) => {
            let handle = StackItem::InteropInterface(Rc::clone(tx) as Rc<dyn InteropInterface>);
            engine.push(handle)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(super) fn transaction_get_hash(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |tx: &Transaction| StackItem::from(tx.hash().to_vec()))
}

pub(super) fn transaction_get_type(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |tx: &Transaction| StackItem::from(tx.tx_type as u32))
}

pub(super) fn transaction_get_attributes(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(tx) = item.as_interface::<Transaction>() else {
        return Ok(false);
    };
    let attributes = handles::<TransactionAttribute>(&tx.attributes);
    push_list(engine, attributes)
}

pub(super) fn transaction_get_inputs(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(tx) = item.as_interface::<Transaction>() else {
        return Ok(false);
    };
    let inputs = handles::<CoinReference>(&tx.inputs);
    push_list(engine, inputs)
}

pub(super) fn transaction_get_outputs(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(tx) = item.as_interface::<Transaction>() else {
        return Ok(false);
    };
    let outputs = handles::<TransactionOutput>(&tx.outputs);
    push_list(engine, outputs)
}

/// The outputs spent by the transaction's inputs, in input order.
pub(super) fn transaction_get_references(
    reader: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(tx) = item.as_interface::<Transaction>() else {
        return Ok(false);
    };
    let mut references = Vec::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        let output = reader
            .snapshot()
            .transaction(&input.prev_hash)
            .and_then(|(previous, _)| previous.outputs.get(usize::from(input.prev_index)).cloned());
        match output {
            Some(output) => references.push(StackItem::from_interface(output)),
            None => return Ok(false),
        }
    }
    push_list(engine, references)
}

pub(super) fn attribute_get_usage(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |attribute: &TransactionAttribute| {
        StackItem::from(u32::from(attribute.usage))
    })
}

pub(super) fn attribute_get_data(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |attribute: &TransactionAttribute| {
        StackItem::from(attribute.data.clone())
    })
}

pub(super) fn input_get_hash(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |input: &CoinReference| {
        StackItem::from(input.prev_hash.to_vec())
    })
}

pub(super) fn input_get_index(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |input: &CoinReference| {
        StackItem::from(u32::from(input.prev_index))
    })
}

pub(super) fn output_get_asset_id(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |output: &TransactionOutput| {
        StackItem::from(output.asset_id.to_vec())
    })
}

pub(super) fn output_get_value(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |output: &TransactionOutput| StackItem::from(output.value))
}

pub(super) fn output_get_script_hash(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |output: &TransactionOutput| {
        StackItem::from(output.script_hash.to_vec())
    })
}

pub(super) fn account_get_script_hash(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |account: &AccountState| {
        StackItem::from(account.script_hash.to_vec())
    })
}

pub(super) fn account_get_votes(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |account: &AccountState| {
        let votes = account.votes.iter().cloned().map(StackItem::from).collect::<Vec<_>>();
        StackItem::from(votes)
    })
}

/// Pops the account, then the asset id.
pub(super) fn account_get_balance(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let item = engine.pop()?;
    let asset_id = engine.pop_bytes()?;
    let Ok(account) = item.as_interface::<AccountState>() else {
        return Ok(false);
    };
    let Some(asset_id) = to_uint256(&asset_id) else {
        return Ok(false);
    };
    let balance = account.balance(&asset_id);
    engine.push(StackItem::from(balance))?;
    Ok(true)
}

pub(super) fn asset_get_asset_id(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.asset_id.to_vec()))
}

pub(super) fn asset_get_asset_type(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.asset_type as u32))
}

pub(super) fn asset_get_amount(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.amount))
}

pub(super) fn asset_get_available(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.available))
}

pub(super) fn asset_get_precision(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| {
        StackItem::from(u32::from(asset.precision))
    })
}

pub(super) fn asset_get_owner(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.owner.clone()))
}

pub(super) fn asset_get_admin(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.admin.to_vec()))
}

pub(super) fn asset_get_issuer(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    read_handle(engine, |asset: &AssetState| StackItem::from(asset.issuer.to_vec()))
}

pub(super) fn contract_get_script(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |contract: &ContractState| {
        StackItem::from(contract.script.clone())
    })
}

pub(super) fn contract_is_payable(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    read_handle(engine, |contract: &ContractState| {
        StackItem::from(contract.is_payable())
    })
}
