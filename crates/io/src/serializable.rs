//! Serialization traits for fixed-layout Neo values.

use crate::{BinaryWriter, IoResult, MemoryReader};

/// A value with a canonical binary encoding.
pub trait Serializable {
    /// The size of the object in bytes after serialization.
    fn size(&self) -> usize;

    fn serialize(&self, writer: &mut BinaryWriter);

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self>
    where
        Self: Sized;
}

/// Byte-array helpers for serializable values.
pub trait SerializableExt: Serializable {
    fn to_array(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.size());
        self.serialize(&mut writer);
        writer.to_bytes()
    }

    fn from_array(data: &[u8]) -> IoResult<Self>
    where
        Self: Sized,
    {
        let mut reader = MemoryReader::new(data);
        Self::deserialize(&mut reader)
    }
}

impl<T: Serializable> SerializableExt for T {}
