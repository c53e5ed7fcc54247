//! Host functions that give scripts access to chain state.
//!
//! A [`StateReader`] is built per execution around a caller-supplied
//! snapshot. It owns the events raised during the run and produces the
//! [`InteropService`] the engine dispatches SYSCALL through.

mod blockchain;
mod ledger;
mod runtime;
mod storage;

use crate::application_engine::gas::storage_put_price;
use crate::ledger::Block;
use crate::snapshot::Snapshot;
use crate::trigger_type::TriggerType;
use bitflags::bitflags;
use neo_core::{UInt160, UInt256};
use neo_vm::{ExecutionEngine, InteropService, StackItem, VmResult};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Raised by `Runtime.Notify`.
#[derive(Debug, Clone)]
pub struct NotifyEventArgs {
    pub script_hash: UInt160,
    pub state: StackItem,
}

/// Raised by `Runtime.Log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEventArgs {
    pub script_hash: UInt160,
    pub message: String,
}

bitflags! {
    /// Legacy namespaces a call is also reachable under.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Aliases: u8 {
        const ANTSHARES = 0b01;
        const SYSTEM = 0b10;
    }
}

type Handler = fn(&StateReader, &mut ExecutionEngine) -> VmResult<bool>;

const BOTH: Aliases = Aliases::ANTSHARES.union(Aliases::SYSTEM);
const ANTSHARES: Aliases = Aliases::ANTSHARES;
const SYSTEM: Aliases = Aliases::SYSTEM;
const NONE: Aliases = Aliases::empty();

/// Fixed-price calls, named without their namespace.
const METHODS: &[(&str, i64, Handler, Aliases)] = &[
    ("Runtime.GetTrigger", 1, runtime::get_trigger, BOTH),
    ("Runtime.CheckWitness", 200, runtime::check_witness, BOTH),
    ("Runtime.Notify", 1, runtime::notify, BOTH),
    ("Runtime.Log", 1, runtime::log, BOTH),
    ("Runtime.GetTime", 1, runtime::get_time, SYSTEM),
    ("Runtime.Serialize", 1, runtime::serialize_item, SYSTEM),
    ("Runtime.Deserialize", 1, runtime::deserialize_item, SYSTEM),
    ("Blockchain.GetHeight", 1, blockchain::get_height, BOTH),
    ("Blockchain.GetHeader", 100, blockchain::get_header, BOTH),
    ("Blockchain.GetBlock", 200, blockchain::get_block, BOTH),
    ("Blockchain.GetTransaction", 100, blockchain::get_transaction, BOTH),
    ("Blockchain.GetTransactionHeight", 100, blockchain::get_transaction_height, SYSTEM),
    ("Blockchain.GetAccount", 100, blockchain::get_account, ANTSHARES),
    ("Blockchain.GetValidators", 200, blockchain::get_validators, ANTSHARES),
    ("Blockchain.GetAsset", 100, blockchain::get_asset, ANTSHARES),
    ("Blockchain.GetContract", 100, blockchain::get_contract, BOTH),
    ("Header.GetIndex", 1, ledger::header_get_index, SYSTEM),
    ("Header.GetHash", 1, ledger::header_get_hash, BOTH),
    ("Header.GetVersion", 1, ledger::header_get_version, ANTSHARES),
    ("Header.GetPrevHash", 1, ledger::header_get_prev_hash, BOTH),
    ("Header.GetMerkleRoot", 1, ledger::header_get_merkle_root, ANTSHARES),
    ("Header.GetTimestamp", 1, ledger::header_get_timestamp, BOTH),
    ("Header.GetConsensusData", 1, ledger::header_get_consensus_data, ANTSHARES),
    ("Header.GetNextConsensus", 1, ledger::header_get_next_consensus, ANTSHARES),
    ("Block.GetTransactionCount", 1, ledger::block_get_transaction_count, BOTH),
    ("Block.GetTransactions", 1, ledger::block_get_transactions, BOTH),
    ("Block.GetTransaction", 1, ledger::block_get_transaction, BOTH),
    ("Transaction.GetHash", 1, ledger::transaction_get_hash, BOTH),
    ("Transaction.GetType", 1, ledger::transaction_get_type, ANTSHARES),
    ("Transaction.GetAttributes", 1, ledger::transaction_get_attributes, ANTSHARES),
    ("Transaction.GetInputs", 1, ledger::transaction_get_inputs, ANTSHARES),
    ("Transaction.GetOutputs", 1, ledger::transaction_get_outputs, ANTSHARES),
    ("Transaction.GetReferences", 200, ledger::transaction_get_references, ANTSHARES),
    ("Attribute.GetUsage", 1, ledger::attribute_get_usage, ANTSHARES),
    ("Attribute.GetData", 1, ledger::attribute_get_data, ANTSHARES),
    ("Input.GetHash", 1, ledger::input_get_hash, ANTSHARES),
    ("Input.GetIndex", 1, ledger::input_get_index, ANTSHARES),
    ("Output.GetAssetId", 1, ledger::output_get_asset_id, ANTSHARES),
    ("Output.GetValue", 1, ledger::output_get_value, ANTSHARES),
    ("Output.GetScriptHash", 1, ledger::output_get_script_hash, ANTSHARES),
    ("Account.GetScriptHash", 1, ledger::account_get_script_hash, ANTSHARES),
    ("Account.GetVotes", 1, ledger::account_get_votes, ANTSHARES),
    ("Account.GetBalance", 1, ledger::account_get_balance, ANTSHARES),
    ("Asset.GetAssetId", 1, ledger::asset_get_asset_id, ANTSHARES),
    ("Asset.GetAssetType", 1, ledger::asset_get_asset_type, ANTSHARES),
    ("Asset.GetAmount", 1, ledger::asset_get_amount, ANTSHARES),
    ("Asset.GetAvailable", 1, ledger::asset_get_available, ANTSHARES),
    ("Asset.GetPrecision", 1, ledger::asset_get_precision, ANTSHARES),
    ("Asset.GetOwner", 1, ledger::asset_get_owner, ANTSHARES),
    ("Asset.GetAdmin", 1, ledger::asset_get_admin, ANTSHARES),
    ("Asset.GetIssuer", 1, ledger::asset_get_issuer, ANTSHARES),
    ("Contract.GetScript", 1, ledger::contract_get_script, ANTSHARES),
    ("Contract.IsPayable", 1, ledger::contract_is_payable, NONE),
    ("Storage.GetContext", 1, storage::get_context, BOTH),
    ("Storage.GetReadOnlyContext", 1, storage::get_read_only_context, SYSTEM),
    ("Storage.Get", 100, storage::get, BOTH),
    ("Storage.Delete", 100, storage::delete, BOTH),
    ("StorageContext.AsReadOnly", 1, storage::as_read_only, SYSTEM),
];

/// Calls charged by payload size.
const STORAGE_WRITES: &[(&str, Handler, Aliases)] = &[
    ("Storage.Put", storage::put, BOTH),
    ("Storage.PutEx", storage::put_ex, SYSTEM),
];

/// Serves chain state and storage to one execution.
pub struct StateReader {
    snapshot: Rc<dyn Snapshot>,
    trigger: TriggerType,
    persisting_block: RefCell<Option<Rc<Block>>>,
    notifications: RefCell<Vec<NotifyEventArgs>>,
    logs: RefCell<Vec<LogEventArgs>>,
}

impl StateReader {
    pub fn new(snapshot: Rc<dyn Snapshot>, trigger: TriggerType) -> Self {
        Self {
            snapshot,
            trigger,
            persisting_block: RefCell::new(None),
            notifications: RefCell::new(Vec::new()),
            logs: RefCell::new(Vec::new()),
        }
    }

    /// Runs against a block that is being persisted; `Runtime.GetTime`
    /// then reports that block's timestamp.
    pub fn set_persisting_block(&self, block: Rc<Block>) {
        *self.persisting_block.borrow_mut() = Some(block);
    }

    pub fn snapshot(&self) -> &Rc<dyn Snapshot> {
        &self.snapshot
    }

    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    pub fn persisting_block(&self) -> Option<Rc<Block>> {
        self.persisting_block.borrow().clone()
    }

    pub fn notifications(&self) -> Ref<'_, Vec<NotifyEventArgs>> {
        self.notifications.borrow()
    }

    pub fn logs(&self) -> Ref<'_, Vec<LogEventArgs>> {
        self.logs.borrow()
    }

    pub(crate) fn push_notification(&self, event: NotifyEventArgs) {
        self.notifications.borrow_mut().push(event);
    }

    pub(crate) fn push_log(&self, event: LogEventArgs) {
        self.logs.borrow_mut().push(event);
    }

    /// The engine's base calls plus every state call bound to `reader`.
    pub fn interop_service(reader: &Rc<Self>) -> InteropService {
        let mut service = InteropService::new();
        for &(suffix, price, handler, aliases) in METHODS {
            let bound = Rc::clone(reader);
            let name = format!("Neo.{suffix}");
            service.register(&name, price, move |engine| handler(&bound, engine));
            register_aliases(&mut service, &name, suffix, aliases);
        }
        for &(suffix, handler, aliases) in STORAGE_WRITES {
            let bound = Rc::clone(reader);
            let name = format!("Neo.{suffix}");
            service.register_dynamic(&name, storage_put_price, move |engine| {
                handler(&bound, engine)
            });
            register_aliases(&mut service, &name, suffix, aliases);
        }
        service.register("System.Runtime.Platform", 1, runtime::platform);
        service
    }
}

fn register_aliases(service: &mut InteropService, name: &str, suffix: &str, aliases: Aliases) {
    if aliases.contains(Aliases::ANTSHARES) {
        service.register_alias(&format!("AntShares.{suffix}"), name);
    }
    if aliases.contains(Aliases::SYSTEM) {
        service.register_alias(&format!("System.{suffix}"), name);
    }
}

/// Parses a 20-byte script hash argument.
fn to_uint160(bytes: &[u8]) -> Option<UInt160> {
    UInt160::from_bytes(bytes).ok()
}

/// Parses a 32-byte hash argument.
fn to_uint256(bytes: &[u8]) -> Option<UInt256> {
    UInt256::from_bytes(bytes).ok()
}
