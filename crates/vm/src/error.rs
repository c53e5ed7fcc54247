//! VM error types.
//!
//! Every opcode handler and interop function returns [`VmResult`]. The engine
//! turns any `Err` into the FAULT state and keeps the error as the fault reason.

use crate::stack_item::StackItemType;
use neo_core::UInt160;
use neo_io::IoError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack underflow: index {index} on a stack of depth {depth}")]
    StackUnderflow { index: usize, depth: usize },

    #[error("invalid type: expected {expected}, found {found}")]
    InvalidType {
        expected: &'static str,
        found: StackItemType,
    },

    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("unknown syscall {0}")]
    UnknownSyscall(String),

    #[error("syscall {0} failed")]
    InteropFailed(String),

    #[error("script {0} not found")]
    ScriptNotFound(UInt160),

    #[error("division by zero")]
    DivisionByZero,

    #[error("insufficient gas: consumed {consumed}, available {available}")]
    OutOfGas { consumed: i64, available: i64 },

    #[error("{limit} limit exceeded")]
    LimitExceeded { limit: &'static str },

    #[error("dynamic invocation is not permitted for {0}")]
    DynamicInvokeDenied(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("THROW executed")]
    Throw,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl VmError {
    pub fn invalid_operation_msg(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn invalid_script_msg(msg: impl Into<String>) -> Self {
        Self::InvalidScript(msg.into())
    }

    pub fn stack_underflow_msg(index: usize, depth: usize) -> Self {
        Self::StackUnderflow { index, depth }
    }

    pub fn invalid_type(expected: &'static str, found: StackItemType) -> Self {
        Self::InvalidType { expected, found }
    }

    pub fn limit_exceeded(limit: &'static str) -> Self {
        Self::LimitExceeded { limit }
    }

    /// Gas exhaustion is reported separately from logic faults.
    pub fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas { .. })
    }
}

pub type VmResult<T> = Result<T, VmError>;
