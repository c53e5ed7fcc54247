//! # Neo Virtual Machine (NeoVM)
//!
//! A stack-based bytecode interpreter compatible with the Neo 2.x virtual
//! machine.
//!
//! Scripts run inside an [`ExecutionEngine`]. Each loaded script gets an
//! [`ExecutionContext`] with its own evaluation and alt stacks; the engine
//! keeps them on an invocation stack and dispatches one instruction at a time
//! through a [`JumpTable`]. Host functionality is reached through SYSCALL and
//! the [`InteropService`] registry.
//!
//! ## Example
//!
//! ```rust
//! use neo_vm::{ExecutionEngine, OpCode, ScriptBuilder, StackItem, VMState};
//!
//! let mut builder = ScriptBuilder::new();
//! builder.emit_push_int(2).emit_push_int(3).emit_opcode(OpCode::ADD);
//!
//! let mut engine = ExecutionEngine::new();
//! engine.load_script(builder.to_script()).unwrap();
//! assert_eq!(engine.execute(), VMState::HALT);
//! assert_eq!(engine.result_stack().peek(0).unwrap(), &StackItem::from(5));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod cycle_tracker;
pub mod error;
pub mod execution_context;
pub mod execution_engine;
pub mod instruction;
pub mod interop_service;
pub mod jump_table;
pub mod op_code;
pub mod random_access_stack;
pub mod script;
pub mod script_builder;
pub mod stack_item;
pub mod traits;
pub mod vm_state;

pub use cycle_tracker::CycleTracker;
pub use error::{VmError, VmResult};
pub use execution_context::ExecutionContext;
pub use execution_engine::{ExecutionEngine, ExecutionEngineLimits};
pub use instruction::Instruction;
pub use interop_service::{
    InteropDescriptor, InteropMethod, InteropPrice, InteropService, PriceCalculator,
};
pub use jump_table::{InstructionHandler, JumpTable};
pub use op_code::{OpCode, OperandSize};
pub use random_access_stack::RandomAccessStack;
pub use script::Script;
pub use script_builder::ScriptBuilder;
pub use stack_item::{
    deserialize, serialize, ArrayRef, DeserializeLimits, InteropInterface, ItemList, Map,
    MapRef, StackItem, StackItemType,
};
pub use traits::{Crypto, NeoCrypto, ScriptContainer, ScriptTable};
pub use vm_state::VMState;
