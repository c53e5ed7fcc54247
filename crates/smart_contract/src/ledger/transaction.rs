//! Transactions and their parts.

use neo_core::{UInt160, UInt256};
use neo_io::{var_bytes_size, var_int_size, BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use neo_vm::{interop_interface, InteropInterface, ScriptContainer};
use std::rc::Rc;

const MAX_ATTRIBUTE_DATA: usize = 65535;
const MAX_ENTRIES: u64 = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TransactionType {
    MinerTransaction = 0x00,
    IssueTransaction = 0x01,
    ClaimTransaction = 0x02,
    EnrollmentTransaction = 0x20,
    RegisterTransaction = 0x40,
    #[default]
    ContractTransaction = 0x80,
    StateTransaction = 0x90,
    PublishTransaction = 0xd0,
    InvocationTransaction = 0xd1,
}

impl TryFrom<u8> for TransactionType {
    type Error = IoError;

    fn try_from(value: u8) -> IoResult<Self> {
        Ok(match value {
            0x00 => Self::MinerTransaction,
            0x01 => Self::IssueTransaction,
            0x02 => Self::ClaimTransaction,
            0x20 => Self::EnrollmentTransaction,
            0x40 => Self::RegisterTransaction,
            0x80 => Self::ContractTransaction,
            0x90 => Self::StateTransaction,
            0xd0 => Self::PublishTransaction,
            0xd1 => Self::InvocationTransaction,
            other => {
                return Err(IoError::invalid_data(format!(
                    "unknown transaction type 0x{other:02x}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionAttribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

interop_interface!(TransactionAttribute, "TransactionAttribute");

/// An input: the output `prev_index` of transaction `prev_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoinReference {
    pub prev_hash: UInt256,
    pub prev_index: u16,
}

interop_interface!(CoinReference, "CoinReference");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOutput {
    pub asset_id: UInt256,
    pub value: i64,
    pub script_hash: UInt160,
}

interop_interface!(TransactionOutput, "TransactionOutput");

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    pub tx_type: TransactionType,
    pub version: u8,
    pub attributes: Vec<TransactionAttribute>,
    pub inputs: Vec<CoinReference>,
    pub outputs: Vec<TransactionOutput>,
    /// Script hashes whose witnesses sign this transaction.
    pub witness_hashes: Vec<UInt160>,
}

impl Transaction {
    /// Hash256 of the unsigned transaction bytes.
    pub fn hash(&self) -> UInt256 {
        UInt256::from(neo_cryptography::hash256(&self.unsigned_data()))
    }

    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.size());
        self.serialize(&mut writer);
        writer.to_bytes()
    }
}

impl Serializable for Transaction {
    fn size(&self) -> usize {
        2 + var_int_size(self.attributes.len() as u64)
            + self
                .attributes
                .iter()
                .map(|a| 1 + var_bytes_size(a.data.len()))
                .sum::<usize>()
            + var_int_size(self.inputs.len() as u64)
            + self.inputs.len() * (UInt256::LENGTH + 2)
            + var_int_size(self.outputs.len() as u64)
            + self.outputs.len() * (UInt256::LENGTH + 8 + UInt160::LENGTH)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.tx_type as u8);
        writer.write_u8(self.version);
        writer.write_var_int(self.attributes.len() as u64);
        for attribute in &self.attributes {
            writer.write_u8(attribute.usage);
            writer.write_var_bytes(&attribute.data);
        }
        writer.write_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            input.prev_hash.serialize(writer);
            writer.write_u16(input.prev_index);
        }
        writer.write_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            output.asset_id.serialize(writer);
            writer.write_u64(output.value as u64);
            output.script_hash.serialize(writer);
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let tx_type = TransactionType::try_from(reader.read_u8()?)?;
        let version = reader.read_u8()?;
        let attributes = (0..reader.read_var_int(MAX_ENTRIES)?)
            .map(|_| {
                Ok(TransactionAttribute {
                    usage: reader.read_u8()?,
                    data: reader.read_var_bytes(MAX_ATTRIBUTE_DATA)?,
                })
            })
            .collect::<IoResult<Vec<_>>>()?;
        let inputs = (0..reader.read_var_int(MAX_ENTRIES)?)
            .map(|_| {
                Ok(CoinReference {
                    prev_hash: UInt256::deserialize(reader)?,
                    prev_index: reader.read_u16()?,
                })
            })
            .collect::<IoResult<Vec<_>>>()?;
        let outputs = (0..reader.read_var_int(MAX_ENTRIES)?)
            .map(|_| {
                Ok(TransactionOutput {
                    asset_id: UInt256::deserialize(reader)?,
                    value: reader.read_u64()? as i64,
                    script_hash: UInt160::deserialize(reader)?,
                })
            })
            .collect::<IoResult<Vec<_>>>()?;
        Ok(Self {
            tx_type,
            version,
            attributes,
            inputs,
            outputs,
            witness_hashes: Vec::new(),
        })
    }
}

interop_interface!(Transaction, "Transaction");

impl ScriptContainer for Transaction {
    fn get_message(&self) -> Vec<u8> {
        self.unsigned_data()
    }

    fn script_hashes_for_verifying(&self) -> Vec<UInt160> {
        let mut hashes = self.witness_hashes.clone();
        hashes.sort();
        hashes.dedup();
        hashes
    }

    fn as_interop(self: Rc<Self>) -> Rc<dyn InteropInterface> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_io::SerializableExt;

    fn sample() -> Transaction {
        Transaction {
            tx_type: TransactionType::InvocationTransaction,
            version: 1,
            attributes: vec![TransactionAttribute {
                usage: 0x20,
                data: vec![0xAB; 20],
            }],
            inputs: vec![CoinReference {
                prev_hash: UInt256::from([1; 32]),
                prev_index: 3,
            }],
            outputs: vec![TransactionOutput {
                asset_id: UInt256::from([2; 32]),
                value: 100_000_000,
                script_hash: UInt160::from([3; 20]),
            }],
            witness_hashes: vec![UInt160::from([3; 20])],
        }
    }

    #[test]
    fn unsigned_data_excludes_witnesses() {
        let tx = sample();
        let bytes = tx.to_array();
        assert_eq!(bytes.len(), tx.size());
        assert_eq!(bytes[0], 0xd1);

        let decoded = Transaction::from_array(&bytes).unwrap();
        assert!(decoded.witness_hashes.is_empty());
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn verifying_hashes_are_sorted_and_unique() {
        let mut tx = sample();
        tx.witness_hashes = vec![UInt160::from([9; 20]), UInt160::from([1; 20]), UInt160::from([9; 20])];
        assert_eq!(
            tx.script_hashes_for_verifying(),
            vec![UInt160::from([1; 20]), UInt160::from([9; 20])]
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Transaction::from_array(&[0x55, 0x00, 0x00, 0x00, 0x00]).is_err());
    }
}
