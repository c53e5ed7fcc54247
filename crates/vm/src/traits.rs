//! Narrow interfaces to the world outside the VM.

use crate::stack_item::InteropInterface;
use neo_core::UInt160;
use std::rc::Rc;

/// Hash and signature primitives used by the crypto opcodes.
pub trait Crypto {
    fn hash160(&self, data: &[u8]) -> [u8; 20];
    fn hash256(&self, data: &[u8]) -> [u8; 32];
    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// secp256r1 with SHA-256, as used on the Neo network.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeoCrypto;

impl Crypto for NeoCrypto {
    fn hash160(&self, data: &[u8]) -> [u8; 20] {
        neo_cryptography::hash160(data)
    }

    fn hash256(&self, data: &[u8]) -> [u8; 32] {
        neo_cryptography::hash256(data)
    }

    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        neo_cryptography::verify_signature(message, signature, public_key)
    }
}

/// Resolves APPCALL, TAILCALL and CALL_E* targets.
pub trait ScriptTable {
    fn get_script(&self, script_hash: &UInt160) -> Option<Vec<u8>>;
}

/// The transaction or block being verified or executed.
pub trait ScriptContainer: InteropInterface {
    /// The bytes signatures are checked against.
    fn get_message(&self) -> Vec<u8>;

    /// Script hashes whose witnesses authorize this container.
    fn script_hashes_for_verifying(&self) -> Vec<UInt160>;

    fn as_interop(self: Rc<Self>) -> Rc<dyn InteropInterface>;
}
