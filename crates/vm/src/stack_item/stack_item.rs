//! Stack item implementation for the Neo Virtual Machine.

use super::compound::{clone_struct, ArrayRef, ItemList, Map, MapRef};
use super::stack_item_type::StackItemType;
use crate::error::{VmError, VmResult};
use neo_config::MAX_SIZE_FOR_BIG_INTEGER;
use num_bigint::BigInt;
use num_traits::Zero;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A host object exposed to scripts as an opaque handle.
pub trait InteropInterface: Any + fmt::Debug {
    /// Gets the type of the interop interface.
    fn interface_type(&self) -> &str;

    /// Allows downcasting to concrete types
    fn as_any(&self) -> &dyn Any;
}

/// Implements [`InteropInterface`] for a host type.
#[macro_export]
macro_rules! interop_interface {
    ($ty:ty, $name:expr) => {
        impl $crate::InteropInterface for $ty {
            fn interface_type(&self) -> &str {
                $name
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Represents a value in the Neo VM.
#[derive(Clone)]
pub enum StackItem {
    ByteArray(Rc<[u8]>),
    Boolean(bool),
    Integer(BigInt),
    /// Shared by reference.
    Array(ArrayRef),
    /// Copied whenever it is stored into another collection.
    Struct(ArrayRef),
    Map(MapRef),
    InteropInterface(Rc<dyn InteropInterface>),
}

/// Minimal two's-complement little-endian form; zero is empty.
pub fn integer_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

impl StackItem {
    pub fn from_bytes(value: impl Into<Rc<[u8]>>) -> Self {
        StackItem::ByteArray(value.into())
    }

    pub fn from_int(value: impl Into<BigInt>) -> Self {
        StackItem::Integer(value.into())
    }

    pub fn from_bool(value: bool) -> Self {
        StackItem::Boolean(value)
    }

    pub fn new_array(items: Vec<StackItem>) -> Self {
        StackItem::Array(ItemList::new(items).into_ref())
    }

    pub fn new_struct(items: Vec<StackItem>) -> Self {
        StackItem::Struct(ItemList::new(items).into_ref())
    }

    pub fn new_map() -> Self {
        StackItem::Map(Map::new().into_ref())
    }

    pub fn from_interface<T: InteropInterface>(value: T) -> Self {
        StackItem::InteropInterface(Rc::new(value))
    }

    pub fn stack_item_type(&self) -> StackItemType {
        match self {
            StackItem::ByteArray(_) => StackItemType::ByteArray,
            StackItem::Boolean(_) => StackItemType::Boolean,
            StackItem::Integer(_) => StackItemType::Integer,
            StackItem::Array(_) => StackItemType::Array,
            StackItem::Struct(_) => StackItemType::Struct,
            StackItem::Map(_) => StackItemType::Map,
            StackItem::InteropInterface(_) => StackItemType::InteropInterface,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.stack_item_type().is_collection()
    }

    /// Converts the stack item to a boolean. Collections and handles are true.
    pub fn as_bool(&self) -> bool {
        match self {
            StackItem::ByteArray(bytes) => {
                bytes.len() > MAX_SIZE_FOR_BIG_INTEGER || bytes.iter().any(|b| *b != 0)
            }
            StackItem::Boolean(value) => *value,
            StackItem::Integer(value) => !value.is_zero(),
            _ => true,
        }
    }

    /// Converts the stack item to an integer. Byte arrays are read as
    /// two's-complement little-endian.
    pub fn as_int(&self) -> VmResult<BigInt> {
        match self {
            StackItem::ByteArray(bytes) => Ok(BigInt::from_signed_bytes_le(bytes)),
            StackItem::Boolean(value) => Ok(BigInt::from(u8::from(*value))),
            StackItem::Integer(value) => Ok(value.clone()),
            other => Err(VmError::invalid_type("Integer", other.stack_item_type())),
        }
    }

    /// Converts the stack item to a byte array.
    pub fn as_bytes(&self) -> VmResult<Rc<[u8]>> {
        match self {
            StackItem::ByteArray(bytes) => Ok(Rc::clone(bytes)),
            StackItem::Boolean(true) => Ok(Rc::from(&[1u8][..])),
            StackItem::Boolean(false) => Ok(Rc::from(&[][..])),
            StackItem::Integer(value) => Ok(Rc::from(integer_to_bytes(value))),
            other => Err(VmError::invalid_type("ByteArray", other.stack_item_type())),
        }
    }

    /// Array or Struct element storage.
    pub fn as_array(&self) -> VmResult<&ArrayRef> {
        match self {
            StackItem::Array(list) | StackItem::Struct(list) => Ok(list),
            other => Err(VmError::invalid_type("Array", other.stack_item_type())),
        }
    }

    pub fn as_map(&self) -> VmResult<&MapRef> {
        match self {
            StackItem::Map(map) => Ok(map),
            other => Err(VmError::invalid_type("Map", other.stack_item_type())),
        }
    }

    /// Downcasts an InteropInterface handle.
    pub fn as_interface<T: InteropInterface>(&self) -> VmResult<&T> {
        match self {
            StackItem::InteropInterface(object) => object
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| VmError::invalid_type("InteropInterface", self.stack_item_type())),
            other => Err(VmError::invalid_type(
                "InteropInterface",
                other.stack_item_type(),
            )),
        }
    }

    /// Byte form used to identify map keys. Only primitives qualify.
    pub fn map_key(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::ByteArray(_) | StackItem::Boolean(_) | StackItem::Integer(_) => {
                Ok(self.as_bytes()?.to_vec())
            }
            other => Err(VmError::invalid_type("map key", other.stack_item_type())),
        }
    }

    /// Struct values are copied before they are stored; everything else is shared.
    pub fn clone_for_store(&self) -> StackItem {
        match self {
            StackItem::Struct(list) => StackItem::Struct(clone_struct(list)),
            other => other.clone(),
        }
    }

    /// Value equality for primitives and structs, identity for arrays, maps
    /// and interop handles. Primitives of different types compare by bytes.
    pub fn equals(&self, other: &StackItem) -> bool {
        match (self, other) {
            (StackItem::Integer(a), StackItem::Integer(b)) => a == b,
            (StackItem::Boolean(a), StackItem::Boolean(b)) => a == b,
            (StackItem::ByteArray(a), StackItem::ByteArray(b)) => a == b,
            (StackItem::Array(a), StackItem::Array(b)) => Rc::ptr_eq(a, b),
            (StackItem::Map(a), StackItem::Map(b)) => Rc::ptr_eq(a, b),
            (StackItem::Struct(a), StackItem::Struct(b)) => struct_equals(a, b),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => {
                std::ptr::eq(
                    Rc::as_ptr(a) as *const (),
                    Rc::as_ptr(b) as *const (),
                )
            }
            (a, b) if !a.is_collection() && !b.is_collection() => {
                match (a.as_bytes(), b.as_bytes()) {
                    (Ok(x), Ok(y)) => x == y,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

fn struct_equals(a: &ArrayRef, b: &ArrayRef) -> bool {
    let mut left = vec![StackItem::Struct(Rc::clone(a))];
    let mut right = vec![StackItem::Struct(Rc::clone(b))];
    while let (Some(x), Some(y)) = (left.pop(), right.pop()) {
        match (&x, &y) {
            (StackItem::Struct(sa), StackItem::Struct(sb)) => {
                if Rc::ptr_eq(sa, sb) {
                    continue;
                }
                let (sa, sb) = (sa.borrow(), sb.borrow());
                if sa.len() != sb.len() {
                    return false;
                }
                left.extend(sa.iter().cloned());
                right.extend(sb.iter().cloned());
            }
            (StackItem::Struct(_), _) => return false,
            _ => {
                if !x.equals(&y) {
                    return false;
                }
            }
        }
    }
    true
}

impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::ByteArray(bytes) => {
                write!(f, "ByteArray(0x")?;
                for b in bytes.iter() {
                    write!(f, "{b:02x}")?;
                }
                write!(f, ")")
            }
            StackItem::Boolean(value) => write!(f, "Boolean({value})"),
            StackItem::Integer(value) => write!(f, "Integer({value})"),
            // Collections may be cyclic; only their size is printed.
            StackItem::Array(list) => write!(f, "Array(len={})", list.borrow().len()),
            StackItem::Struct(list) => write!(f, "Struct(len={})", list.borrow().len()),
            StackItem::Map(map) => write!(f, "Map(len={})", map.borrow().len()),
            StackItem::InteropInterface(object) => {
                write!(f, "InteropInterface({})", object.interface_type())
            }
        }
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        StackItem::Boolean(value)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StackItem {
            fn from(value: $ty) -> Self {
                StackItem::Integer(BigInt::from(value))
            }
        })*
    };
}

from_integer!(i32, i64, u32, u64, usize);

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        StackItem::Integer(value)
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        StackItem::ByteArray(value.into())
    }
}

impl From<&[u8]> for StackItem {
    fn from(value: &[u8]) -> Self {
        StackItem::ByteArray(value.into())
    }
}

impl From<&str> for StackItem {
    fn from(value: &str) -> Self {
        StackItem::ByteArray(value.as_bytes().into())
    }
}

impl From<Vec<StackItem>> for StackItem {
    fn from(value: Vec<StackItem>) -> Self {
        StackItem::new_array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Handle;
    crate::interop_interface!(Handle, "Handle");

    #[test]
    fn integer_byte_forms() {
        assert!(StackItem::from(0).as_bytes().unwrap().is_empty());
        assert_eq!(&*StackItem::from(-1).as_bytes().unwrap(), &[0xff]);
        assert_eq!(&*StackItem::from(128).as_bytes().unwrap(), &[0x80, 0x00]);
        assert_eq!(&*StackItem::from(-128).as_bytes().unwrap(), &[0x80]);
        assert_eq!(
            StackItem::from(vec![0x80u8]).as_int().unwrap(),
            BigInt::from(-128)
        );
        assert_eq!(StackItem::from(Vec::<u8>::new()).as_int().unwrap(), BigInt::zero());
    }

    #[test]
    fn only_primitives_are_map_keys() {
        assert_eq!(StackItem::from(1).map_key().unwrap(), vec![1]);
        assert_eq!(StackItem::from(true).map_key().unwrap(), vec![1]);
        assert!(StackItem::from_interface(Handle).map_key().is_err());
        assert!(StackItem::new_map().map_key().is_err());
        assert!(StackItem::new_struct(Vec::new()).map_key().is_err());
    }

    #[test]
    fn boolean_conversions() {
        assert!(!StackItem::from(vec![0u8, 0]).as_bool());
        assert!(StackItem::from(vec![0u8, 1]).as_bool());
        assert!(StackItem::from(vec![0u8; 33]).as_bool());
        assert!(!StackItem::from(Vec::<u8>::new()).as_bool());
        assert!(StackItem::new_array(Vec::new()).as_bool());
        assert!(StackItem::from_interface(Handle).as_bool());
        assert_eq!(&*StackItem::from(true).as_bytes().unwrap(), &[1]);
        assert!(StackItem::from(false).as_bytes().unwrap().is_empty());
    }

    #[test]
    fn collections_do_not_convert_to_primitives() {
        let array = StackItem::new_array(Vec::new());
        assert!(array.as_bytes().is_err());
        assert!(array.as_int().is_err());
        assert!(StackItem::from_interface(Handle).as_bytes().is_err());
    }

    #[test]
    fn cross_type_equality_uses_bytes() {
        assert!(StackItem::from(1).equals(&StackItem::from(true)));
        assert!(StackItem::from(vec![1u8]).equals(&StackItem::from(1)));
        assert!(!StackItem::from(vec![1u8, 0]).equals(&StackItem::from(1)));
        assert!(!StackItem::from(1).equals(&StackItem::new_array(Vec::new())));
    }

    #[test]
    fn reference_and_structural_equality() {
        let a = StackItem::new_array(vec![StackItem::from(1)]);
        let b = StackItem::new_array(vec![StackItem::from(1)]);
        assert!(a.equals(&a.clone()));
        assert!(!a.equals(&b));

        let s1 = StackItem::new_struct(vec![
            StackItem::from(1),
            StackItem::new_struct(vec![StackItem::from("x")]),
        ]);
        let s2 = StackItem::new_struct(vec![
            StackItem::from(vec![1u8]),
            StackItem::new_struct(vec![StackItem::from("x")]),
        ]);
        let s3 = StackItem::new_struct(vec![StackItem::from(1), StackItem::from("x")]);
        assert!(s1.equals(&s2));
        assert!(!s1.equals(&s3));
        assert!(!s1.equals(&StackItem::new_array(Vec::new())));

        let handle = StackItem::from_interface(Handle);
        assert!(handle.equals(&handle.clone()));
        assert!(!handle.equals(&StackItem::from_interface(Handle)));
    }

    #[test]
    fn interop_downcast() {
        let handle = StackItem::from_interface(Handle);
        assert!(handle.as_interface::<Handle>().is_ok());
        assert!(StackItem::from(1).as_interface::<Handle>().is_err());
    }

    #[test]
    fn struct_is_copied_for_store() {
        let original = StackItem::new_struct(vec![StackItem::from(1)]);
        let stored = original.clone_for_store();
        stored.as_array().unwrap().borrow_mut().push(StackItem::from(2));
        assert_eq!(original.as_array().unwrap().borrow().len(), 1);

        let array = StackItem::new_array(Vec::new());
        let shared = array.clone_for_store();
        shared.as_array().unwrap().borrow_mut().push(StackItem::from(2));
        assert_eq!(array.as_array().unwrap().borrow().len(), 1);
    }
}
