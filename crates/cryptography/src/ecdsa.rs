//! ECDSA over secp256r1 with SHA-256 message digests.
//!
//! Signatures are the 64-byte `r || s` form. Public keys may be SEC1
//! compressed (33 bytes), uncompressed (65 bytes) or raw `x || y` (64 bytes).

use crate::{Error, Result};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;

fn parse_public_key(public_key: &[u8]) -> Result<VerifyingKey> {
    let key = if public_key.len() == 64 {
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend_from_slice(public_key);
        PublicKey::from_sec1_bytes(&sec1)
    } else {
        PublicKey::from_sec1_bytes(public_key)
    }
    .map_err(|e| Error::InvalidKey(format!("Invalid public key: {e}")))?;
    Ok(VerifyingKey::from(key))
}

/// Verifies `signature` over `message`. Malformed keys or signatures verify as false.
pub fn verify_signature(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    if signature.len() != 64 {
        return false;
    }
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    match parse_public_key(public_key) {
        Ok(verifying_key) => verifying_key.verify(message, &sig).is_ok(),
        Err(_) => false,
    }
}

/// Decodes a SEC1 point on secp256r1 and returns its compressed form.
pub fn decode_point(public_key: &[u8]) -> Result<Vec<u8>> {
    let key = PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| Error::InvalidKey(format!("Invalid public key: {e}")))?;
    Ok(key.to_encoded_point(true).as_bytes().to_vec())
}

/// Signs `message` with a 32-byte private key, returning `r || s`.
pub fn sign(message: &[u8], private_key: &[u8; 32]) -> Result<[u8; 64]> {
    let signing_key = SigningKey::from_slice(private_key)
        .map_err(|e| Error::InvalidKey(format!("Invalid private key: {e}")))?;
    let signature: Signature = signing_key.sign(message);
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Returns the compressed (33-byte) public key of a private key.
pub fn derive_public_key(private_key: &[u8; 32]) -> Result<Vec<u8>> {
    let signing_key = SigningKey::from_slice(private_key)
        .map_err(|e| Error::InvalidKey(format!("Invalid private key: {e}")))?;
    let public_key = PublicKey::from(signing_key.verifying_key());
    Ok(public_key.to_encoded_point(true).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn sign_then_verify() {
        let public_key = derive_public_key(&KEY).unwrap();
        assert_eq!(public_key.len(), 33);
        let signature = sign(b"message", &KEY).unwrap();
        assert!(verify_signature(b"message", &signature, &public_key));
        assert!(!verify_signature(b"other", &signature, &public_key));
    }

    #[test]
    fn malformed_inputs_do_not_verify() {
        let public_key = derive_public_key(&KEY).unwrap();
        assert!(!verify_signature(b"m", &[0u8; 63], &public_key));
        assert!(!verify_signature(b"m", &[0u8; 64], &public_key));
        let signature = sign(b"m", &KEY).unwrap();
        assert!(!verify_signature(b"m", &signature, &[0x02; 10]));
        assert!(sign(b"m", &[0u8; 32]).is_err());
    }

    #[test]
    fn decode_point_compresses_valid_keys() {
        let public_key = derive_public_key(&KEY).unwrap();
        assert_eq!(decode_point(&public_key).unwrap(), public_key);
        let mut off_curve = public_key.clone();
        off_curve[0] = 0x05;
        assert!(decode_point(&off_curve).is_err());
        // x equal to the field modulus is not a coordinate
        let mut beyond_field = vec![0x02];
        beyond_field.extend_from_slice(
            &hex::decode("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff").unwrap(),
        );
        assert!(decode_point(&beyond_field).is_err());
    }
}
