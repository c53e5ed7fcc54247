//! Account and asset state.

use neo_core::{UInt160, UInt256};
use neo_vm::interop_interface;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountState {
    pub script_hash: UInt160,
    pub is_frozen: bool,
    /// Encoded public keys the account votes for.
    pub votes: Vec<Vec<u8>>,
    pub balances: BTreeMap<UInt256, i64>,
}

impl AccountState {
    /// An empty account, returned for hashes the chain has never seen.
    pub fn new(script_hash: UInt160) -> Self {
        Self {
            script_hash,
            ..Default::default()
        }
    }

    pub fn balance(&self, asset_id: &UInt256) -> i64 {
        self.balances.get(asset_id).copied().unwrap_or(0)
    }
}

interop_interface!(AccountState, "AccountState");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AssetType {
    #[default]
    GoverningToken = 0x00,
    UtilityToken = 0x01,
    Currency = 0x08,
    Share = 0x90,
    Invoice = 0x98,
    Token = 0x60,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetState {
    pub asset_id: UInt256,
    pub asset_type: AssetType,
    pub name: String,
    pub amount: i64,
    pub available: i64,
    pub precision: u8,
    /// Encoded owner public key.
    pub owner: Vec<u8>,
    pub admin: UInt160,
    pub issuer: UInt160,
    pub expiration: u32,
    pub is_frozen: bool,
}

interop_interface!(AssetState, "AssetState");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_balance_is_zero() {
        let mut account = AccountState::new(UInt160::from([1; 20]));
        let asset = UInt256::from([2; 32]);
        assert_eq!(account.balance(&asset), 0);
        account.balances.insert(asset, 42);
        assert_eq!(account.balance(&asset), 42);
    }
}
