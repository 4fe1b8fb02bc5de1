//! Integration-level unit tests for the CryptoService public API.
//!
//! These tests exercise password hashing and key generation through the
//! `CryptoServiceTrait` interface.

use linkshelf::services::crypto_service::{CryptoService, CryptoServiceTrait, SigningKey};
use linkshelf::types::errors::CryptoError;

fn fast() -> CryptoService {
    CryptoService::with_iterations(1_000)
}

/// Two hashes of the same password differ because each uses a fresh salt,
/// yet both verify.
#[test]
fn test_hashes_are_salted() {
    let service = fast();
    let a = service.hash_password("hunter2").unwrap();
    let b = service.hash_password("hunter2").unwrap();

    assert_ne!(a, b, "Each hash must use its own salt");
    assert!(service.verify_password("hunter2", &a).unwrap());
    assert!(service.verify_password("hunter2", &b).unwrap());
}

#[test]
fn test_hash_format_records_iterations() {
    let encoded = fast().hash_password("pw").unwrap();
    let parts: Vec<&str> = encoded.split('$').collect();

    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "pbkdf2-sha256");
    assert_eq!(parts[1], "1000");
}

/// A hash made with one iteration count still verifies on a service
/// configured with another, since the count is stored in the hash.
#[test]
fn test_verify_uses_stored_iteration_count() {
    let encoded = CryptoService::with_iterations(10).hash_password("secret").unwrap();
    assert!(fast().verify_password("secret", &encoded).unwrap());
}

#[test]
fn test_wrong_password_does_not_verify() {
    let service = fast();
    let encoded = service.hash_password("correct horse").unwrap();
    assert!(!service.verify_password("battery staple", &encoded).unwrap());
}

#[test]
fn test_malformed_hash_is_an_error() {
    let service = fast();
    for bad in ["", "plaintext", "md5$1$AA==$AA==", "pbkdf2-sha256$0$AA==$AA==", "pbkdf2-sha256$10$!!$AA=="] {
        assert!(
            matches!(service.verify_password("x", bad), Err(CryptoError::InvalidHash(_))),
            "'{}' should be rejected as an invalid hash",
            bad
        );
    }
}

#[test]
fn test_zero_iterations_is_clamped() {
    let service = CryptoService::with_iterations(0);
    let encoded = service.hash_password("pw").unwrap();
    assert!(encoded.starts_with("pbkdf2-sha256$1$"));
}

#[test]
fn test_random_bytes_have_requested_length() {
    let service = fast();
    assert_eq!(service.generate_random_bytes(0).unwrap().len(), 0);
    assert_eq!(service.generate_random_bytes(48).unwrap().len(), 48);
    assert_eq!(service.generate_salt().unwrap().len(), 16);
}

#[test]
fn test_signing_keys_are_unique_and_hidden_from_debug() {
    let service = fast();
    let a = service.generate_signing_key().unwrap();
    let b = service.generate_signing_key().unwrap();

    assert_eq!(a.as_bytes().len(), 64);
    assert_ne!(a.as_bytes(), b.as_bytes());
    assert_eq!(format!("{:?}", a), "SigningKey(..)");
}

#[test]
fn test_signing_key_from_bytes() {
    let key = SigningKey::from_bytes(vec![7u8; 32]);
    assert_eq!(key.as_bytes(), &[7u8; 32][..]);
}
