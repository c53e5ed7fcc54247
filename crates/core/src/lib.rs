//! Core value types shared across the Neo virtual machine crates.
//!
//! [`UInt160`] identifies scripts and accounts; [`UInt256`] identifies
//! transactions, blocks and assets.

mod error;
mod uint;

pub use error::{CoreError, CoreResult};
pub use uint::{UInt160, UInt256};
