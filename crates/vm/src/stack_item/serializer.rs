//! Binary serialization of stack items.
//!
//! Layout: one type tag, then a var-bytes payload for ByteArray and Integer,
//! one byte for Boolean, or a var-int count followed by the children for
//! Array, Struct (elements) and Map (key, value pairs). Interop handles and
//! compounds that appear more than once cannot be serialized.

use super::compound::{ItemList, Map};
use super::stack_item::integer_to_bytes;
use super::{StackItem, StackItemType};
use crate::error::{VmError, VmResult};
use neo_io::{BinaryWriter, MemoryReader};
use num_bigint::BigInt;
use std::collections::HashSet;
use std::rc::Rc;

/// Limits applied while reading untrusted input.
#[derive(Debug, Clone, Copy)]
pub struct DeserializeLimits {
    pub max_array_size: usize,
    /// Bounds every var-bytes payload, integers included.
    pub max_item_size: usize,
}

impl Default for DeserializeLimits {
    fn default() -> Self {
        Self {
            max_array_size: neo_config::MAX_ARRAY_SIZE,
            max_item_size: neo_config::MAX_ITEM_SIZE,
        }
    }
}

pub fn serialize(item: &StackItem) -> VmResult<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    let mut seen = HashSet::new();
    let mut pending = vec![item.clone()];

    while let Some(item) = pending.pop() {
        match &item {
            StackItem::ByteArray(bytes) => {
                writer.write_u8(StackItemType::ByteArray as u8);
                writer.write_var_bytes(bytes);
            }
            StackItem::Boolean(value) => {
                writer.write_u8(StackItemType::Boolean as u8);
                writer.write_bool(*value);
            }
            StackItem::Integer(value) => {
                writer.write_u8(StackItemType::Integer as u8);
                writer.write_var_bytes(&integer_to_bytes(value));
            }
            StackItem::InteropInterface(_) => {
                return Err(VmError::Serialization(
                    "interop handles are not serializable".to_string(),
                ))
            }
            StackItem::Array(list) | StackItem::Struct(list) => {
                if !seen.insert(Rc::as_ptr(list) as usize) {
                    return Err(VmError::Serialization(
                        "compound item referenced more than once".to_string(),
                    ));
                }
                writer.write_u8(item.stack_item_type() as u8);
                let list = list.borrow();
                writer.write_var_int(list.len() as u64);
                pending.extend(list.iter().rev().cloned());
            }
            StackItem::Map(map) => {
                if !seen.insert(Rc::as_ptr(map) as usize) {
                    return Err(VmError::Serialization(
                        "compound item referenced more than once".to_string(),
                    ));
                }
                writer.write_u8(StackItemType::Map as u8);
                let map = map.borrow();
                writer.write_var_int(map.len() as u64);
                for (key, value) in map.iter().rev() {
                    pending.push(value.clone());
                    pending.push(key.clone());
                }
            }
        }
    }
    Ok(writer.to_bytes())
}

enum Slot {
    Item(StackItem),
    Placeholder { kind: StackItemType, count: usize },
}

/// Reads one item from the front of `data`. Trailing bytes are ignored.
pub fn deserialize(data: &[u8], limits: &DeserializeLimits) -> VmResult<StackItem> {
    let mut reader = MemoryReader::new(data);
    let mut slots = Vec::new();
    let mut remaining: usize = 1;

    while remaining > 0 {
        remaining -= 1;
        let tag = reader.read_u8()?;
        let kind = StackItemType::from_u8(tag)
            .ok_or_else(|| VmError::Serialization(format!("unknown type tag 0x{tag:02x}")))?;
        match kind {
            StackItemType::ByteArray => {
                let bytes = reader.read_var_bytes(limits.max_item_size)?;
                slots.push(Slot::Item(StackItem::from(bytes)));
            }
            StackItemType::Boolean => {
                slots.push(Slot::Item(StackItem::from(reader.read_bool()?)));
            }
            StackItemType::Integer => {
                let bytes = reader.read_var_bytes(limits.max_item_size)?;
                slots.push(Slot::Item(StackItem::from(BigInt::from_signed_bytes_le(
                    &bytes,
                ))));
            }
            StackItemType::Array | StackItemType::Struct => {
                let count = reader.read_var_int(limits.max_array_size as u64)? as usize;
                slots.push(Slot::Placeholder { kind, count });
                remaining += count;
            }
            StackItemType::Map => {
                let count = reader.read_var_int(limits.max_array_size as u64)? as usize;
                slots.push(Slot::Placeholder { kind, count });
                remaining += count * 2;
            }
            StackItemType::InteropInterface => {
                return Err(VmError::Serialization(
                    "interop handles are not deserializable".to_string(),
                ))
            }
        }
    }

    // Assemble bottom-up: children are always read after their container.
    let mut built: Vec<StackItem> = Vec::new();
    while let Some(slot) = slots.pop() {
        let item = match slot {
            Slot::Item(item) => item,
            Slot::Placeholder { kind, count } => match kind {
                StackItemType::Map => {
                    let mut map = Map::new();
                    for _ in 0..count {
                        let key = pop_built(&mut built)?;
                        let value = pop_built(&mut built)?;
                        if map.insert(key, value)?.is_some() {
                            return Err(VmError::Serialization("duplicate map key".to_string()));
                        }
                    }
                    StackItem::Map(map.into_ref())
                }
                _ => {
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(pop_built(&mut built)?);
                    }
                    let list = ItemList::new(items).into_ref();
                    if kind == StackItemType::Struct {
                        StackItem::Struct(list)
                    } else {
                        StackItem::Array(list)
                    }
                }
            },
        };
        built.push(item);
    }
    pop_built(&mut built)
}

fn pop_built(built: &mut Vec<StackItem>) -> VmResult<StackItem> {
    built
        .pop()
        .ok_or_else(|| VmError::Serialization("malformed item layout".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(item: &StackItem) -> Vec<u8> {
        let bytes = serialize(item).unwrap();
        let back = deserialize(&bytes, &DeserializeLimits::default()).unwrap();
        assert_eq!(serialize(&back).unwrap(), bytes);
        bytes
    }

    #[test]
    fn primitive_layouts() {
        assert_eq!(roundtrip(&StackItem::from(vec![0xAAu8])), vec![0x00, 0x01, 0xAA]);
        assert_eq!(roundtrip(&StackItem::from(true)), vec![0x01, 0x01]);
        assert_eq!(roundtrip(&StackItem::from(0)), vec![0x02, 0x00]);
        assert_eq!(roundtrip(&StackItem::from(-1)), vec![0x02, 0x01, 0xFF]);
    }

    #[test]
    fn nested_compounds_roundtrip_in_order() {
        let map = StackItem::new_map();
        map.as_map()
            .unwrap()
            .borrow_mut()
            .insert(StackItem::from("k"), StackItem::new_struct(vec![StackItem::from(7)]))
            .unwrap();
        let item = StackItem::new_array(vec![StackItem::from(1), map, StackItem::from(false)]);
        let bytes = roundtrip(&item);
        assert_eq!(
            bytes,
            vec![
                0x80, 0x03, // array of 3
                0x02, 0x01, 0x01, // 1
                0x82, 0x01, // map of 1
                0x00, 0x01, b'k', // key
                0x81, 0x01, 0x02, 0x01, 0x07, // struct [7]
                0x01, 0x00, // false
            ]
        );
        let back = deserialize(&bytes, &DeserializeLimits::default()).unwrap();
        let list = back.as_array().unwrap().borrow();
        assert!(matches!(list[1], StackItem::Map(_)));
        assert_eq!(list[0], StackItem::from(1));
    }

    #[test]
    fn shared_or_cyclic_compounds_are_rejected() {
        let inner = StackItem::new_array(Vec::new());
        let outer = StackItem::new_array(vec![inner.clone(), inner]);
        assert!(matches!(serialize(&outer), Err(VmError::Serialization(_))));

        let cyclic = StackItem::new_array(Vec::new());
        cyclic
            .as_array()
            .unwrap()
            .borrow_mut()
            .push(cyclic.clone());
        assert!(serialize(&cyclic).is_err());
        cyclic.as_array().unwrap().borrow_mut().clear();
    }

    #[test]
    fn deserialize_enforces_limits() {
        let limits = DeserializeLimits {
            max_array_size: 2,
            ..DeserializeLimits::default()
        };
        assert!(deserialize(&[0x80, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], &limits).is_err());
        assert!(deserialize(&[0x80, 0x02, 0x00, 0x00], &limits).is_err());
        let small = DeserializeLimits {
            max_item_size: 4,
            ..DeserializeLimits::default()
        };
        let too_wide = [vec![0x02, 5], vec![1u8; 5]].concat();
        assert!(deserialize(&too_wide, &small).is_err());
        assert!(deserialize(&[0x40], &DeserializeLimits::default()).is_err());
        assert!(deserialize(&[0x82, 0x01, 0x80, 0x00, 0x00, 0x00], &limits).is_err());
    }

    #[test]
    fn integers_wider_than_arithmetic_limit_roundtrip() {
        let wide: BigInt = -(BigInt::from(1u8) << 300u32);
        let bytes = serialize(&StackItem::from(wide.clone())).unwrap();
        let back = deserialize(&bytes, &DeserializeLimits::default()).unwrap();
        assert_eq!(back.as_int().unwrap(), wide);
    }

    #[test]
    fn nonzero_boolean_byte_reads_true() {
        let item = deserialize(&[0x01, 0x05], &DeserializeLimits::default()).unwrap();
        assert_eq!(item, StackItem::from(true));
    }
}
