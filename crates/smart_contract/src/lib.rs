//! Smart contract execution for Neo 2.x.
//!
//! Binds the [`neo_vm`] interpreter to chain state: the
//! [`ApplicationEngine`] meters gas and enforces resource limits, and the
//! [`StateReader`] serves the `Neo.*` syscalls against a [`Snapshot`].
//!
//! ```
//! use neo_smart_contract::{ApplicationEngine, MemorySnapshot};
//! use neo_vm::{OpCode, ScriptBuilder, VMState};
//! use std::rc::Rc;
//!
//! let mut sb = ScriptBuilder::new();
//! sb.emit_push_int(6).emit_push_int(7).emit_opcode(OpCode::MUL);
//!
//! let engine =
//!     ApplicationEngine::run(sb.to_array(), Rc::new(MemorySnapshot::new()), None, false).unwrap();
//! assert_eq!(engine.state(), VMState::HALT);
//! assert_eq!(engine.result_stack().peek(0).unwrap().as_int().unwrap(), 42.into());
//! ```

pub mod application_engine;
pub mod contract_state;
pub mod error;
pub mod interop;
pub mod ledger;
pub mod snapshot;
pub mod storage;
pub mod trigger_type;

pub use application_engine::{ApplicationEngine, GasMeter, Governor, StackSizeTracker};
pub use contract_state::{ContractPropertyState, ContractState};
pub use error::{Error, Result};
pub use interop::{LogEventArgs, NotifyEventArgs, StateReader};
pub use snapshot::{Blockchain, MemorySnapshot, Snapshot, SnapshotScriptTable, Storage};
pub use storage::{StorageContext, StorageItem, StorageKey};
pub use trigger_type::TriggerType;
