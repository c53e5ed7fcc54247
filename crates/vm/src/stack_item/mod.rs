//! Stack item module for the Neo Virtual Machine.

pub mod compound;
pub mod serializer;
#[allow(clippy::module_inception)]
pub mod stack_item;
pub mod stack_item_type;

pub use compound::{ArrayRef, ItemList, Map, MapRef};
pub use serializer::{deserialize, serialize, DeserializeLimits};
pub use stack_item::{integer_to_bytes, InteropInterface, StackItem};
pub use stack_item_type::StackItemType;
