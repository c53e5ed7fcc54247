//! The state a script may read and write.
//!
//! The engine never commits anything itself. Writes made before a FAULT stay
//! in the snapshot; the caller decides whether to keep or discard it.

use crate::contract_state::ContractState;
use crate::ledger::{AccountState, AssetState, Block, Header, Transaction};
use crate::storage::{StorageItem, StorageKey};
use neo_core::{UInt160, UInt256};
use neo_vm::ScriptTable;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Read access to chain state.
pub trait Blockchain {
    /// Index of the latest persisted block.
    fn height(&self) -> u32;

    fn block_hash(&self, index: u32) -> Option<UInt256>;

    fn header(&self, hash: &UInt256) -> Option<Rc<Header>>;

    fn block(&self, hash: &UInt256) -> Option<Rc<Block>>;

    /// The transaction and the height of the block containing it.
    fn transaction(&self, hash: &UInt256) -> Option<(Rc<Transaction>, u32)>;

    fn account(&self, script_hash: &UInt160) -> Option<AccountState>;

    fn asset(&self, asset_id: &UInt256) -> Option<AssetState>;

    fn contract(&self, script_hash: &UInt160) -> Option<Rc<ContractState>>;

    /// Public keys of the current validators.
    fn validators(&self) -> Vec<Vec<u8>> {
        Vec::new()
    }
}

/// Contract storage.
pub trait Storage {
    fn get_storage(&self, key: &StorageKey) -> Option<StorageItem>;

    fn put_storage(&self, key: StorageKey, item: StorageItem);

    fn delete_storage(&self, key: &StorageKey);
}

/// Everything a state reader needs.
pub trait Snapshot: Blockchain + Storage {}

impl<T: Blockchain + Storage> Snapshot for T {}

/// Resolves APPCALL targets through the snapshot's deployed contracts.
pub struct SnapshotScriptTable {
    snapshot: Rc<dyn Snapshot>,
}

impl SnapshotScriptTable {
    pub fn new(snapshot: Rc<dyn Snapshot>) -> Self {
        Self { snapshot }
    }
}

impl ScriptTable for SnapshotScriptTable {
    fn get_script(&self, script_hash: &UInt160) -> Option<Vec<u8>> {
        self.snapshot
            .contract(script_hash)
            .map(|contract| contract.script.clone())
    }
}

/// An in-memory snapshot.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    headers: RefCell<HashMap<UInt256, Rc<Header>>>,
    blocks: RefCell<HashMap<UInt256, Rc<Block>>>,
    block_hashes: RefCell<BTreeMap<u32, UInt256>>,
    transactions: RefCell<HashMap<UInt256, (Rc<Transaction>, u32)>>,
    accounts: RefCell<HashMap<UInt160, AccountState>>,
    assets: RefCell<HashMap<UInt256, AssetState>>,
    contracts: RefCell<HashMap<UInt160, Rc<ContractState>>>,
    storage: RefCell<BTreeMap<StorageKey, StorageItem>>,
    validators: RefCell<Vec<Vec<u8>>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a block along with its header and transactions.
    pub fn add_block(&self, block: Block) -> UInt256 {
        let hash = block.hash();
        let index = block.header.index;
        for transaction in &block.transactions {
            self.transactions
                .borrow_mut()
                .insert(transaction.hash(), (Rc::clone(transaction), index));
        }
        self.headers
            .borrow_mut()
            .insert(hash, Rc::new(block.header.clone()));
        self.block_hashes.borrow_mut().insert(index, hash);
        self.blocks.borrow_mut().insert(hash, Rc::new(block));
        hash
    }

    pub fn add_account(&self, account: AccountState) {
        self.accounts
            .borrow_mut()
            .insert(account.script_hash, account);
    }

    pub fn add_asset(&self, asset: AssetState) {
        self.assets.borrow_mut().insert(asset.asset_id, asset);
    }

    /// Deploys a contract and returns its script hash.
    pub fn add_contract(&self, contract: ContractState) -> UInt160 {
        let hash = contract.script_hash();
        self.contracts.borrow_mut().insert(hash, Rc::new(contract));
        hash
    }

    pub fn set_validators(&self, public_keys: Vec<Vec<u8>>) {
        *self.validators.borrow_mut() = public_keys;
    }

    /// All storage entries in key order.
    pub fn storage_entries(&self) -> Vec<(StorageKey, StorageItem)> {
        self.storage
            .borrow()
            .iter()
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }
}

impl Blockchain for MemorySnapshot {
    fn height(&self) -> u32 {
        self.block_hashes
            .borrow()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    fn block_hash(&self, index: u32) -> Option<UInt256> {
        self.block_hashes.borrow().get(&index).copied()
    }

    fn header(&self, hash: &UInt256) -> Option<Rc<Header>> {
        self.headers.borrow().get(hash).cloned()
    }

    fn block(&self, hash: &UInt256) -> Option<Rc<Block>> {
        self.blocks.borrow().get(hash).cloned()
    }

    fn transaction(&self, hash: &UInt256) -> Option<(Rc<Transaction>, u32)> {
        self.transactions.borrow().get(hash).cloned()
    }

    fn account(&self, script_hash: &UInt160) -> Option<AccountState> {
        self.accounts.borrow().get(script_hash).cloned()
    }

    fn asset(&self, asset_id: &UInt256) -> Option<AssetState> {
        self.assets.borrow().get(asset_id).cloned()
    }

    fn contract(&self, script_hash: &UInt160) -> Option<Rc<ContractState>> {
        self.contracts.borrow().get(script_hash).cloned()
    }

    fn validators(&self) -> Vec<Vec<u8>> {
        self.validators.borrow().clone()
    }
}

impl Storage for MemorySnapshot {
    fn get_storage(&self, key: &StorageKey) -> Option<StorageItem> {
        self.storage.borrow().get(key).cloned()
    }

    fn put_storage(&self, key: StorageKey, item: StorageItem) {
        self.storage.borrow_mut().insert(key, item);
    }

    fn delete_storage(&self, key: &StorageKey) {
        self.storage.borrow_mut().remove(key);
    }
}
