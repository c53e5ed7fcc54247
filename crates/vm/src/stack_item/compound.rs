//! Shared storage behind Array, Struct and Map items.
//!
//! Both containers release their children iteratively, so dropping a deeply
//! nested structure never recurses on the native stack.

use super::StackItem;
use crate::error::VmResult;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Shared, mutable element list of an Array or Struct.
pub type ArrayRef = Rc<RefCell<ItemList>>;

/// Shared, mutable Map.
pub type MapRef = Rc<RefCell<Map>>;

#[derive(Default)]
pub struct ItemList(Vec<StackItem>);

impl ItemList {
    pub fn new(items: Vec<StackItem>) -> Self {
        Self(items)
    }

    pub fn into_vec(mut self) -> Vec<StackItem> {
        std::mem::take(&mut self.0)
    }

    pub fn into_ref(self) -> ArrayRef {
        Rc::new(RefCell::new(self))
    }
}

impl Deref for ItemList {
    type Target = Vec<StackItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ItemList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<StackItem>> for ItemList {
    fn from(items: Vec<StackItem>) -> Self {
        Self(items)
    }
}

impl Drop for ItemList {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.0));
    }
}

/// A map keyed by the byte form of primitive items, in insertion order.
#[derive(Default)]
pub struct Map {
    entries: IndexMap<Vec<u8>, (StackItem, StackItem)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_ref(self) -> MapRef {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &StackItem) -> VmResult<Option<&StackItem>> {
        let key = key.map_key()?;
        Ok(self.entries.get(&key).map(|(_, value)| value))
    }

    pub fn contains_key(&self, key: &StackItem) -> VmResult<bool> {
        Ok(self.entries.contains_key(&key.map_key()?))
    }

    /// Inserts or replaces a value. An existing entry keeps its key item and position.
    pub fn insert(&mut self, key: StackItem, value: StackItem) -> VmResult<Option<StackItem>> {
        let map_key = key.map_key()?;
        if let Some(entry) = self.entries.get_mut(&map_key) {
            return Ok(Some(std::mem::replace(&mut entry.1, value)));
        }
        self.entries.insert(map_key, (key, value));
        Ok(None)
    }

    /// Removes an entry, preserving the order of the others.
    pub fn remove(&mut self, key: &StackItem) -> VmResult<Option<StackItem>> {
        let key = key.map_key()?;
        Ok(self.entries.shift_remove(&key).map(|(_, value)| value))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &StackItem> {
        self.entries.values().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &StackItem> {
        self.entries.values().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&StackItem, &StackItem)> {
        self.entries.values().map(|(key, value)| (key, value))
    }

    fn take_items(&mut self) -> Vec<StackItem> {
        std::mem::take(&mut self.entries)
            .into_values()
            .flat_map(|(key, value)| [key, value])
            .collect()
    }

    pub(crate) fn clear(&mut self) -> Vec<StackItem> {
        self.take_items()
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        release(self.take_items());
    }
}

/// Drops `pending` without recursion by unwrapping uniquely owned children.
pub(crate) fn release(mut pending: Vec<StackItem>) {
    while let Some(item) = pending.pop() {
        match item {
            StackItem::Array(list) | StackItem::Struct(list) => {
                if let Ok(cell) = Rc::try_unwrap(list) {
                    pending.extend(cell.into_inner().into_vec());
                }
            }
            StackItem::Map(map) => {
                if let Ok(cell) = Rc::try_unwrap(map) {
                    pending.extend(cell.into_inner().take_items());
                }
            }
            _ => {}
        }
    }
}

/// Copies a struct, recursively copying nested structs. Arrays and maps
/// inside it stay shared.
pub fn clone_struct(source: &ArrayRef) -> ArrayRef {
    let root = ItemList::default().into_ref();
    let mut queue = vec![(Rc::clone(source), Rc::clone(&root))];
    while let Some((src, dst)) = queue.pop() {
        let src = src.borrow();
        let mut dst = dst.borrow_mut();
        dst.reserve(src.len());
        for item in src.iter() {
            match item {
                StackItem::Struct(inner) => {
                    let copy = ItemList::default().into_ref();
                    dst.push(StackItem::Struct(Rc::clone(&copy)));
                    queue.push((Rc::clone(inner), copy));
                }
                other => dst.push(other.clone()),
            }
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_nesting_drops_without_overflow() {
        let mut item = StackItem::new_array(Vec::new());
        for _ in 0..200_000 {
            item = StackItem::new_array(vec![item]);
        }
        drop(item);

        let mut map_item = StackItem::new_map();
        for _ in 0..100_000 {
            let map = Map::new().into_ref();
            map.borrow_mut()
                .insert(StackItem::from(1), map_item)
                .unwrap();
            map_item = StackItem::Map(map);
        }
        drop(map_item);
    }

    #[test]
    fn map_keeps_insertion_order_and_original_key() {
        let mut map = Map::new();
        map.insert(StackItem::from(1), StackItem::from(10)).unwrap();
        map.insert(StackItem::from(2), StackItem::from(20)).unwrap();
        map.insert(StackItem::from(3), StackItem::from(30)).unwrap();
        // Integer 1 and byte array [0x01] are the same key.
        let old = map
            .insert(StackItem::from(vec![0x01u8]), StackItem::from(11))
            .unwrap();
        assert_eq!(old, Some(StackItem::from(10)));
        assert!(matches!(map.keys().next(), Some(StackItem::Integer(_))));

        map.remove(&StackItem::from(2)).unwrap();
        let keys: Vec<_> = map.keys().map(|k| k.as_int().unwrap()).collect();
        assert_eq!(keys, vec![1.into(), 3.into()]);
    }

    #[test]
    fn collection_keys_are_rejected() {
        let mut map = Map::new();
        assert!(map
            .insert(StackItem::new_array(Vec::new()), StackItem::from(1))
            .is_err());
        assert!(map.get(&StackItem::new_map()).is_err());
    }

    #[test]
    fn struct_clone_copies_nested_structs_only() {
        let shared_array = StackItem::new_array(vec![StackItem::from(1)]);
        let inner = StackItem::new_struct(vec![StackItem::from(2)]);
        let outer = ItemList::new(vec![inner.clone(), shared_array.clone()]).into_ref();

        let copy = clone_struct(&outer);
        let copy = copy.borrow();
        match (&copy[0], &inner) {
            (StackItem::Struct(a), StackItem::Struct(b)) => assert!(!Rc::ptr_eq(a, b)),
            _ => panic!("expected structs"),
        }
        match (&copy[1], &shared_array) {
            (StackItem::Array(a), StackItem::Array(b)) => assert!(Rc::ptr_eq(a, b)),
            _ => panic!("expected arrays"),
        }
    }
}
