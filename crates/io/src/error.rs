use thiserror::Error;

/// Errors produced while reading or writing binary data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    #[error("unexpected end of data: needed {needed} bytes at offset {offset}")]
    EndOfStream { offset: usize, needed: usize },

    #[error("var-int value {value} exceeds maximum {max}")]
    VarIntTooLarge { value: u64, max: u64 },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl IoError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

/// Result type for IO operations.
pub type IoResult<T> = Result<T, IoError>;
