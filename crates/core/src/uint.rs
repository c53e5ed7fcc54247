//! Fixed-width little-endian hash values.
//!
//! Both types store their bytes in wire (little-endian) order and display
//! them reversed with a `0x` prefix, the way Neo tooling prints hashes.

use crate::{CoreError, CoreResult};
use neo_config::{ADDRESS_SIZE, HASH_SIZE};
use neo_io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! define_uint {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const LENGTH: usize = $size;

            pub const fn zero() -> Self {
                Self([0u8; $size])
            }

            pub fn from_bytes(value: &[u8]) -> CoreResult<Self> {
                let bytes: [u8; $size] =
                    value.try_into().map_err(|_| CoreError::InvalidLength {
                        expected: $size,
                        actual: value.len(),
                    })?;
                Ok(Self(bytes))
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut reversed = self.0;
                reversed.reverse();
                write!(f, "0x{}", hex::encode(reversed))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            /// Parses the display form (big-endian hex, optional `0x`).
            fn from_str(s: &str) -> CoreResult<Self> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes =
                    hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
                bytes.reverse();
                Self::from_bytes(&bytes)
            }
        }

        impl Serializable for $name {
            fn size(&self) -> usize {
                $size
            }

            fn serialize(&self, writer: &mut BinaryWriter) {
                writer.write_bytes(&self.0);
            }

            fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
                Ok(Self(reader.read_fixed::<$size>()?))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_uint!(
    /// A 160-bit hash, used for script hashes.
    UInt160,
    ADDRESS_SIZE
);

define_uint!(
    /// A 256-bit hash, used for transaction, block and asset identifiers.
    UInt256,
    HASH_SIZE
);

#[cfg(test)]
mod tests {
    use super::*;
    use neo_io::SerializableExt;

    #[test]
    fn display_reverses_byte_order() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x01;
        let hash = UInt160::from(bytes);
        assert_eq!(
            hash.to_string(),
            "0x0000000000000000000000000000000000000001"
        );
        assert_eq!(hash.to_string().parse::<UInt160>().unwrap(), hash);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            UInt256::from_bytes(&[0u8; 31]),
            Err(CoreError::InvalidLength {
                expected: 32,
                actual: 31
            })
        );
        assert!("0x1234".parse::<UInt160>().is_err());
        assert!(matches!("zz".parse::<UInt160>(), Err(CoreError::InvalidHex(_))));
    }

    #[test]
    fn binary_and_json_forms() {
        let hash = UInt256::from([7u8; 32]);
        assert_eq!(hash.to_array(), vec![7u8; 32]);
        assert_eq!(UInt256::from_array(&hash.to_array()).unwrap(), hash);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(serde_json::from_str::<UInt256>(&json).unwrap(), hash);
        assert!(UInt160::zero().is_zero());
    }
}
