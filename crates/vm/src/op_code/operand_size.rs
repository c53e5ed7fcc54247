//! Operand size information for Neo VM opcodes.

/// Either a fixed operand length or the width of a little-endian length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSize {
    /// The size of the operand, if fixed
    size: usize,

    /// The size prefix of the operand, if variable
    size_prefix: usize,
}

impl OperandSize {
    pub const fn fixed(size: usize) -> Self {
        Self {
            size,
            size_prefix: 0,
        }
    }

    pub const fn prefix(size_prefix: usize) -> Self {
        Self {
            size: 0,
            size_prefix,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn size_prefix(&self) -> usize {
        self.size_prefix
    }

    pub fn has_size_prefix(&self) -> bool {
        self.size_prefix > 0
    }
}
