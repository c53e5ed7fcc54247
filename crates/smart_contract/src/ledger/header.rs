//! Block headers and blocks as seen by contracts.

use super::Transaction;
use neo_core::{UInt160, UInt256};
use neo_io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use neo_vm::interop_interface;
use std::rc::Rc;

/// The unsigned part of a block header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u32,
    pub prev_hash: UInt256,
    pub merkle_root: UInt256,
    pub timestamp: u32,
    pub index: u32,
    pub consensus_data: u64,
    pub next_consensus: UInt160,
}

impl Header {
    /// Hash256 of the unsigned header bytes.
    pub fn hash(&self) -> UInt256 {
        let mut writer = BinaryWriter::with_capacity(self.size());
        self.serialize(&mut writer);
        UInt256::from(neo_cryptography::hash256(writer.as_bytes()))
    }
}

impl Serializable for Header {
    fn size(&self) -> usize {
        4 + UInt256::LENGTH * 2 + 4 + 4 + 8 + UInt160::LENGTH
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        self.prev_hash.serialize(writer);
        self.merkle_root.serialize(writer);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.index);
        writer.write_u64(self.consensus_data);
        self.next_consensus.serialize(writer);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            version: reader.read_u32()?,
            prev_hash: UInt256::deserialize(reader)?,
            merkle_root: UInt256::deserialize(reader)?,
            timestamp: reader.read_u32()?,
            index: reader.read_u32()?,
            consensus_data: reader.read_u64()?,
            next_consensus: UInt160::deserialize(reader)?,
        })
    }
}

interop_interface!(Header, "Header");

/// A header with its transactions.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Rc<Transaction>>,
}

impl Block {
    pub fn hash(&self) -> UInt256 {
        self.header.hash()
    }
}

interop_interface!(Block, "Block");
