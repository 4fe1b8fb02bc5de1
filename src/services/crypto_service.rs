use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::errors::CryptoError;

/// PBKDF2 iteration count for password hashing.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes for PBKDF2.
const SALT_LENGTH: usize = 16;

/// Derived hash length in bytes.
const HASH_LENGTH: usize = 32;

/// Signing key length in bytes (HS256 block size).
const SIGNING_KEY_LENGTH: usize = 64;

/// Scheme tag leading every encoded password hash.
const HASH_SCHEME: &str = "pbkdf2-sha256";

/// Process-wide token signing secret. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Wraps existing key material.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Trait defining the cryptographic operations used for accounts and tokens.
pub trait CryptoServiceTrait: Send + Sync {
    /// Hashes a password with a fresh random salt.
    ///
    /// The result is self-describing: `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
    fn hash_password(&self, password: &str) -> Result<String, CryptoError>;

    /// Checks a password against an encoded hash in constant time.
    fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, CryptoError>;

    /// Generates a cryptographically secure random salt.
    fn generate_salt(&self) -> Result<Vec<u8>, CryptoError>;

    /// Generates cryptographically secure random bytes of the specified length.
    fn generate_random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError>;

    /// Generates a fresh signing key for access tokens.
    fn generate_signing_key(&self) -> Result<SigningKey, CryptoError>;
}

/// Implementation of cryptographic services using the `ring` crate.
pub struct CryptoService {
    rng: SystemRandom,
    iterations: NonZeroU32,
}

impl CryptoService {
    /// Creates a new CryptoService with the production iteration count.
    pub fn new() -> Self {
        Self::with_iterations(PBKDF2_ITERATIONS)
    }

    /// Creates a CryptoService hashing with `iterations` rounds. Zero is raised to one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            rng: SystemRandom::new(),
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
        }
    }

    fn decode_hash(encoded: &str) -> Result<(NonZeroU32, Vec<u8>, Vec<u8>), CryptoError> {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != 4 || parts[0] != HASH_SCHEME {
            return Err(CryptoError::InvalidHash("unknown hash format".to_string()));
        }

        let iterations = parts[1]
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| CryptoError::InvalidHash("bad iteration count".to_string()))?;
        let salt = STANDARD
            .decode(parts[2])
            .map_err(|e| CryptoError::InvalidHash(e.to_string()))?;
        let hash = STANDARD
            .decode(parts[3])
            .map_err(|e| CryptoError::InvalidHash(e.to_string()))?;

        Ok((iterations, salt, hash))
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoServiceTrait for CryptoService {
    fn hash_password(&self, password: &str) -> Result<String, CryptoError> {
        let salt = self.generate_salt()?;
        let mut hash = vec![0u8; HASH_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        let encoded = format!(
            "{}${}${}${}",
            HASH_SCHEME,
            self.iterations,
            STANDARD.encode(&salt),
            STANDARD.encode(&hash)
        );
        hash.zeroize();
        Ok(encoded)
    }

    fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, CryptoError> {
        let (iterations, salt, hash) = Self::decode_hash(encoded)?;
        let matches = pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &hash,
        )
        .is_ok();
        Ok(matches)
    }

    fn generate_salt(&self) -> Result<Vec<u8>, CryptoError> {
        self.generate_random_bytes(SALT_LENGTH)
    }

    fn generate_random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError> {
        let mut bytes = vec![0u8; length];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate random bytes".to_string()))?;
        Ok(bytes)
    }

    fn generate_signing_key(&self) -> Result<SigningKey, CryptoError> {
        self.generate_random_bytes(SIGNING_KEY_LENGTH).map(SigningKey)
    }
}
