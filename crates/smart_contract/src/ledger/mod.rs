//! Ledger state exposed to contracts through the state reader.

mod account;
mod header;
mod transaction;

pub use account::{AccountState, AssetState, AssetType};
pub use header::{Block, Header};
pub use transaction::{
    CoinReference, Transaction, TransactionAttribute, TransactionOutput, TransactionType,
};
