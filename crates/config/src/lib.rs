//! Neo Configuration Module
//!
//! Wire constants shared by the virtual machine and the application engine,
//! plus the serde-loadable settings that let a host tighten or relax them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Blockchain timing constants
pub const SECONDS_PER_BLOCK: u64 = 15;

/// Size of a hash (UInt256) in bytes
pub const HASH_SIZE: usize = 32;
/// Size of an address (UInt160) in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Maximum number of items on all stacks of an engine.
pub const MAX_STACK_SIZE: usize = 2048;
/// Maximum size of a single item in bytes (1 MiB).
pub const MAX_ITEM_SIZE: usize = 1024 * 1024;
/// Maximum number of elements in an array, struct or map.
pub const MAX_ARRAY_SIZE: usize = 1024;
/// Maximum depth of the invocation stack.
pub const MAX_INVOCATION_STACK_SIZE: usize = 1024;
/// Maximum serialized length of an integer operand or result.
pub const MAX_SIZE_FOR_BIG_INTEGER: usize = 32;
/// Upper bound for SHL/SHR shift amounts.
pub const MAX_SHL_SHR: i64 = 256;
/// Lower bound for SHL/SHR shift amounts.
pub const MIN_SHL_SHR: i64 = -256;
/// Maximum length of a SYSCALL name.
pub const MAX_SYSCALL_NAME_LENGTH: usize = 252;
/// Maximum storage key length accepted by `Storage.Put`.
pub const MAX_STORAGE_KEY_SIZE: usize = 1024;

/// Fixed-point factor of one GAS (10^8 units).
pub const GAS_FACTOR: i64 = 100_000_000;
/// Units debited per unit of opcode price.
pub const GAS_RATIO: i64 = 100_000;
/// Gas every invocation receives for free.
pub const GAS_FREE: i64 = 10 * GAS_FACTOR;
/// Instruction cap for test-mode runs.
pub const MAX_FREE_OPS: u64 = 500_000;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Structural limits enforced on every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmLimits {
    pub max_stack_size: usize,
    pub max_item_size: usize,
    pub max_array_size: usize,
    pub max_invocation_stack_size: usize,
    pub max_size_for_big_integer: usize,
    pub max_shl_shr: i64,
    pub min_shl_shr: i64,
}

impl VmLimits {
    /// Limits used on MainNet.
    pub const DEFAULT: Self = Self {
        max_stack_size: MAX_STACK_SIZE,
        max_item_size: MAX_ITEM_SIZE,
        max_array_size: MAX_ARRAY_SIZE,
        max_invocation_stack_size: MAX_INVOCATION_STACK_SIZE,
        max_size_for_big_integer: MAX_SIZE_FOR_BIG_INTEGER,
        max_shl_shr: MAX_SHL_SHR,
        min_shl_shr: MIN_SHL_SHR,
    };
}

impl Default for VmLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Gas accounting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSettings {
    pub ratio: i64,
    pub free: i64,
    pub max_free_ops: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            ratio: GAS_RATIO,
            free: GAS_FREE,
            max_free_ops: MAX_FREE_OPS,
        }
    }
}

/// Settings consumed by the execution and application engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSettings {
    pub limits: VmLimits,
    pub gas: GasSettings,
}

impl VmSettings {
    /// Parses settings from TOML text. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects settings the engines cannot operate under.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.gas.ratio <= 0 {
            return Err(ConfigError::Invalid {
                field: "gas.ratio",
                reason: "must be positive".to_string(),
            });
        }
        if self.gas.free < 0 {
            return Err(ConfigError::Invalid {
                field: "gas.free",
                reason: "must not be negative".to_string(),
            });
        }
        if self.limits.min_shl_shr > self.limits.max_shl_shr {
            return Err(ConfigError::Invalid {
                field: "limits.min_shl_shr",
                reason: "exceeds limits.max_shl_shr".to_string(),
            });
        }
        if self.limits.max_stack_size == 0 || self.limits.max_invocation_stack_size == 0 {
            return Err(ConfigError::Invalid {
                field: "limits",
                reason: "stack sizes must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
