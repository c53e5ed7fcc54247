//! VM state.

use std::fmt;

/// Indicates the status of the VM.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum VMState {
    /// Execution is in progress or has not yet begun.
    #[default]
    NONE = 0,

    /// Execution completed and the result stack holds the outputs.
    HALT = 1 << 0,

    /// Execution stopped on an error. Terminal.
    FAULT = 1 << 1,

    /// Paused on a breakpoint.
    BREAK = 1 << 2,
}

impl VMState {
    #[inline]
    pub fn contains(self, flag: VMState) -> bool {
        (self as u8 & flag as u8) != 0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == VMState::NONE
    }

    #[inline]
    pub fn is_halt(self) -> bool {
        self.contains(VMState::HALT)
    }

    #[inline]
    pub fn is_fault(self) -> bool {
        self.contains(VMState::FAULT)
    }

    #[inline]
    pub fn is_break(self) -> bool {
        self.contains(VMState::BREAK)
    }

    /// HALT and FAULT end execution; BREAK can be resumed.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self.is_halt() || self.is_fault()
    }
}

impl fmt::Display for VMState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VMState::NONE => "NONE",
            VMState::HALT => "HALT",
            VMState::FAULT => "FAULT",
            VMState::BREAK => "BREAK",
        };
        f.write_str(name)
    }
}
