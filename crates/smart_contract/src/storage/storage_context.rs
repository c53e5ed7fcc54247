//! The handle scripts pass to storage syscalls.

use neo_core::UInt160;
use neo_vm::interop_interface;

/// Grants access to one contract's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageContext {
    pub script_hash: UInt160,
    pub is_read_only: bool,
}

impl StorageContext {
    pub fn new(script_hash: UInt160) -> Self {
        Self {
            script_hash,
            is_read_only: false,
        }
    }

    pub fn as_read_only(self) -> Self {
        Self {
            is_read_only: true,
            ..self
        }
    }
}

interop_interface!(StorageContext, "StorageContext");
