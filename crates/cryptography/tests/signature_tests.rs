use neo_cryptography::{derive_public_key, sign, verify_signature};
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use proptest::prelude::*;

fn uncompressed(private_key: &[u8; 32]) -> Vec<u8> {
    let signing_key = SigningKey::from_slice(private_key).unwrap();
    PublicKey::from(signing_key.verifying_key())
        .to_encoded_point(false)
        .as_bytes()
        .to_vec()
}

#[test]
fn accepts_all_public_key_encodings() {
    let private_key = [0x42; 32];
    let signature = sign(b"payload", &private_key).unwrap();
    let full = uncompressed(&private_key);
    assert_eq!(full.len(), 65);
    assert!(verify_signature(b"payload", &signature, &full));
    assert!(verify_signature(b"payload", &signature, &full[1..]));
    assert!(verify_signature(
        b"payload",
        &signature,
        &derive_public_key(&private_key).unwrap()
    ));
}

#[test]
fn signature_from_another_key_fails() {
    let signature = sign(b"payload", &[0x01; 32]).unwrap();
    let other = derive_public_key(&[0x02; 32]).unwrap();
    assert!(!verify_signature(b"payload", &signature, &other));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn signatures_bind_the_message(message in proptest::collection::vec(any::<u8>(), 0..64), flip in any::<u8>()) {
        let private_key = [0x07; 32];
        let public_key = derive_public_key(&private_key).unwrap();
        let signature = sign(&message, &private_key).unwrap();
        prop_assert!(verify_signature(&message, &signature, &public_key));

        let mut tampered = message.clone();
        tampered.push(flip);
        prop_assert!(!verify_signature(&tampered, &signature, &public_key));
    }
}
