//! Stack item type tags.

use std::fmt;

/// Type tags, also used as the first byte of each serialized item.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum StackItemType {
    ByteArray = 0x00,
    Boolean = 0x01,
    Integer = 0x02,
    InteropInterface = 0x40,
    Array = 0x80,
    Struct = 0x81,
    Map = 0x82,
}

impl StackItemType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::ByteArray),
            0x01 => Some(Self::Boolean),
            0x02 => Some(Self::Integer),
            0x40 => Some(Self::InteropInterface),
            0x80 => Some(Self::Array),
            0x81 => Some(Self::Struct),
            0x82 => Some(Self::Map),
            _ => None,
        }
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Self::Array | Self::Struct | Self::Map)
    }
}

impl fmt::Display for StackItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
