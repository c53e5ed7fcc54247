//! Contract storage types.

mod storage_context;
mod storage_item;
mod storage_key;

pub use storage_context::StorageContext;
pub use storage_item::StorageItem;
pub use storage_key::StorageKey;
