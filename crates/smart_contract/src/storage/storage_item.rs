//! Storage item implementation for smart contract storage.

use serde::{Deserialize, Serialize};

/// A value in contract storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageItem {
    pub value: Vec<u8>,
    /// Constant items can never be overwritten or deleted.
    pub is_constant: bool,
}

impl StorageItem {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            is_constant: false,
        }
    }

    pub fn new_constant(value: Vec<u8>) -> Self {
        Self {
            value,
            is_constant: true,
        }
    }
}
