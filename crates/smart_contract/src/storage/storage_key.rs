//! Storage key implementation for smart contract storage.

use neo_config::MAX_STORAGE_KEY_SIZE;
use neo_core::UInt160;
use neo_io::{var_bytes_size, BinaryWriter, IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A key in contract storage, scoped to the owning contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct StorageKey {
    pub script_hash: UInt160,
    pub key: Vec<u8>,
}

impl StorageKey {
    pub fn new(script_hash: UInt160, key: Vec<u8>) -> Self {
        Self { script_hash, key }
    }

    /// Checks if this key has a specific prefix.
    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        self.key.starts_with(prefix)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.script_hash, hex::encode(&self.key))
    }
}

impl Serializable for StorageKey {
    fn size(&self) -> usize {
        UInt160::LENGTH + var_bytes_size(self.key.len())
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        Serializable::serialize(&self.script_hash, writer);
        writer.write_var_bytes(&self.key);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            script_hash: <UInt160 as Serializable>::deserialize(reader)?,
            key: reader.read_var_bytes(MAX_STORAGE_KEY_SIZE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_io::SerializableExt;

    #[test]
    fn display_and_encoding() {
        let key = StorageKey::new(UInt160::zero(), b"ab".to_vec());
        assert!(key.to_string().ends_with(":6162"));
        assert!(key.has_prefix(b"a"));
        let bytes = key.to_array();
        assert_eq!(bytes.len(), 23);
        assert_eq!(StorageKey::from_array(&bytes).unwrap(), key);
    }

    #[test]
    fn oversized_key_is_rejected_on_read() {
        let mut writer = BinaryWriter::new();
        Serializable::serialize(&UInt160::zero(), &mut writer);
        writer.write_var_bytes(&vec![0; MAX_STORAGE_KEY_SIZE + 1]);
        assert!(StorageKey::from_array(&writer.to_bytes()).is_err());
    }

    #[test]
    fn json_form_uses_hash_string() {
        let key = StorageKey::new(UInt160::zero(), vec![1]);
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["script_hash"], UInt160::zero().to_string());
        assert_eq!(serde_json::from_value::<StorageKey>(json).unwrap(), key);
    }
}
