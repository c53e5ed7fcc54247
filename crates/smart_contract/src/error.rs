//! Error types for the smart contract layer.

use neo_config::ConfigError;
use neo_core::CoreError;
use neo_io::IoError;
use neo_vm::VmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Vm(#[from] VmError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid trigger type: {0}")]
    InvalidTrigger(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
