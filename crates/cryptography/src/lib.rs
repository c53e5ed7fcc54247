//! Cryptographic primitives used by the Neo virtual machine.
//!
//! Hashes back the `SHA1`/`SHA256`/`HASH160`/`HASH256` opcodes and script
//! identity; [`ecdsa`] backs `CHECKSIG`, `VERIFY` and `CHECKMULTISIG`.

pub mod ecdsa;
pub mod hash;

pub use ecdsa::{decode_point, derive_public_key, sign, verify_signature};
pub use hash::{hash160, hash256, ripemd160, sha1, sha256};

use thiserror::Error;

/// Errors produced by key and signature handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, Error>;
