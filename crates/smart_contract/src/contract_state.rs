//! Contract state management for Neo smart contracts.
//!
//! A deployed contract is its script plus a few flags that gate storage
//! access, dynamic invocation and incoming transfers.

use bitflags::bitflags;
use neo_core::UInt160;
use neo_vm::interop_interface;

bitflags! {
    /// Capabilities a contract declared at deployment.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContractPropertyState: u8 {
        const NO_PROPERTY = 0;
        const HAS_STORAGE = 1 << 0;
        const HAS_DYNAMIC_INVOKE = 1 << 1;
        const PAYABLE = 1 << 2;
    }
}

/// Represents the state of a deployed smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContractState {
    pub script: Vec<u8>,
    pub parameter_list: Vec<u8>,
    pub return_type: u8,
    pub contract_properties: ContractPropertyState,
    pub name: String,
    pub code_version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

impl ContractState {
    pub fn new(script: Vec<u8>, contract_properties: ContractPropertyState) -> Self {
        Self {
            script,
            contract_properties,
            ..Default::default()
        }
    }

    /// Hash160 of the script; the contract's identity.
    pub fn script_hash(&self) -> UInt160 {
        UInt160::from(neo_cryptography::hash160(&self.script))
    }

    pub fn has_storage(&self) -> bool {
        self.contract_properties
            .contains(ContractPropertyState::HAS_STORAGE)
    }

    pub fn has_dynamic_invoke(&self) -> bool {
        self.contract_properties
            .contains(ContractPropertyState::HAS_DYNAMIC_INVOKE)
    }

    pub fn is_payable(&self) -> bool {
        self.contract_properties.contains(ContractPropertyState::PAYABLE)
    }
}

interop_interface!(ContractState, "ContractState");
