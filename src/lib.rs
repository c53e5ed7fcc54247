//! # neo2-rs: the Neo 2.x smart-contract virtual machine
//!
//! A bytecode interpreter for Neo 2.x scripts together with the
//! application engine that runs them against chain state under gas and
//! resource limits.
//!
//! ## Quick Start
//!
//! ```rust
//! use neo2_rs::prelude::*;
//! use std::rc::Rc;
//!
//! let mut sb = ScriptBuilder::new();
//! sb.emit_push_int(2).emit_push_int(3).emit_opcode(OpCode::ADD);
//!
//! let engine = ApplicationEngine::run(sb.to_array(), Rc::new(MemorySnapshot::new()), None, false)
//!     .expect("script loads");
//! assert_eq!(engine.state(), VMState::HALT);
//! assert_eq!(engine.gas_consumed(), neo2_rs::config::GAS_RATIO);
//! ```
//!
//! ## Architecture
//!
//! - [`neo_config`] - Wire limits and loadable VM settings
//! - [`neo_io`] - Binary reader and writer
//! - [`neo_core`] - Script and block hash types
//! - [`neo_cryptography`] - Hashes and secp256r1 signatures
//! - [`neo_vm`] - The interpreter and its interop registry
//! - [`neo_smart_contract`] - Application engine and state syscalls

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use neo_config as config;
pub use neo_core as core;
pub use neo_cryptography as crypto;
pub use neo_io as io;
pub use neo_smart_contract as smart_contract;
pub use neo_vm as vm;

/// Common imports for running scripts
pub mod prelude {
    pub use crate::config::{VmLimits, VmSettings};
    pub use crate::core::{UInt160, UInt256};
    pub use crate::smart_contract::{
        ApplicationEngine, ContractPropertyState, ContractState, MemorySnapshot, Snapshot,
        TriggerType,
    };
    pub use crate::vm::{
        ExecutionEngine, InteropService, OpCode, Script, ScriptBuilder, StackItem, VMState,
        VmError,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
