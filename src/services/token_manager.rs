//! Access tokens for linkshelf.
//!
//! Tokens are HS256 JWTs signed with a key generated once per process.
//! The web pages read them from the `token` cookie, the API from a
//! `Bearer` authorization header; both paths share [`TokenManager::validate`].

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::managers::account_manager::AccountStore;
use crate::services::crypto_service::{CryptoServiceTrait, SigningKey};
use crate::types::account::{AccessClaims, LoginRequest};
use crate::types::errors::{AuthError, TokenRejection};

/// Lifetime of a normal session.
pub const SESSION_TTL_SECS: i64 = 12 * 60 * 60;
/// Lifetime of a "remember me" session.
pub const REMEMBER_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Name of the session cookie read by the page routes.
pub const SESSION_COOKIE: &str = "token";

const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";

/// Maximum accepted token length (8 KiB).
const MAX_TOKEN_LENGTH: usize = 8192;

pub struct TokenManager {
    signing_key: SigningKey,
    accounts: Arc<dyn AccountStore>,
    crypto: Arc<dyn CryptoServiceTrait>,
    /// Verified against on unknown usernames so lookups and mismatches cost the same.
    dummy_hash: String,
}

impl TokenManager {
    pub fn new(
        signing_key: SigningKey,
        accounts: Arc<dyn AccountStore>,
        crypto: Arc<dyn CryptoServiceTrait>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = crypto
            .hash_password("linkshelf-unknown-account")
            .map_err(|e| AuthError::SigningFailed(e.to_string()))?;
        Ok(Self {
            signing_key,
            accounts,
            crypto,
            dummy_hash,
        })
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown usernames and wrong passwords both fail with
    /// `AuthenticationFailed` after the same amount of hashing work.
    pub fn login(&self, request: &LoginRequest, now: i64) -> Result<String, AuthError> {
        let account = self
            .accounts
            .get_accounts(&request.username, true)
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .into_iter()
            .next();

        let (encoded, account_id) = match &account {
            Some(account) => (account.password.as_str(), Some(account.id)),
            None => (self.dummy_hash.as_str(), None),
        };
        let verified = self
            .crypto
            .verify_password(&request.password, encoded)
            .unwrap_or(false);

        match (verified, account_id) {
            (true, Some(id)) => {
                info!(account = id, remember = request.remember, "Login succeeded");
                self.issue(id, request.remember, now)
            }
            _ => {
                debug!("Login rejected");
                Err(AuthError::AuthenticationFailed)
            }
        }
    }

    /// Signs a token for `account_id` valid from `now`.
    pub fn issue(&self, account_id: i64, remember: bool, now: i64) -> Result<String, AuthError> {
        let ttl = if remember { REMEMBER_TTL_SECS } else { SESSION_TTL_SECS };
        let claims = AccessClaims {
            nbf: now,
            exp: now + ttl,
            sub: account_id.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.signing_key.as_bytes()),
        )
        .map_err(|e| AuthError::SigningFailed(e.to_string()))
    }

    /// Verifies signature, algorithm, validity window and subject at time `now`.
    pub fn validate(&self, token: &str, now: i64) -> Result<AccessClaims, AuthError> {
        let rejection = |reason: TokenRejection| {
            debug!(%reason, "Token rejected");
            AuthError::AuthorizationFailed(reason)
        };

        let token = token.trim();
        if token.is_empty() {
            return Err(rejection(TokenRejection::Missing));
        }
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(rejection(TokenRejection::Malformed));
        }

        let header = decode_header(token).map_err(|_| rejection(TokenRejection::Malformed))?;
        if header.alg != Algorithm::HS256 {
            return Err(rejection(TokenRejection::UnexpectedAlgorithm));
        }

        // Time and subject checks are done below against `now`, not the wall clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.signing_key.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => rejection(TokenRejection::BadSignature),
            ErrorKind::InvalidAlgorithm => rejection(TokenRejection::UnexpectedAlgorithm),
            _ => rejection(TokenRejection::Malformed),
        })?;
        let claims = data.claims;

        if now < claims.nbf {
            return Err(rejection(TokenRejection::NotYetValid));
        }
        if now >= claims.exp {
            return Err(rejection(TokenRejection::Expired));
        }
        if claims.account_id().is_none() {
            return Err(rejection(TokenRejection::MissingSubject));
        }
        Ok(claims)
    }

    /// Validates the `token` cookie from a raw `Cookie` header.
    pub fn validate_session_cookie(&self, cookie_header: Option<&str>, now: i64) -> Result<AccessClaims, AuthError> {
        let token = cookie_header.and_then(|header| cookie_value(header, SESSION_COOKIE));
        match token {
            Some(token) => self.validate(token, now),
            None => Err(AuthError::AuthorizationFailed(TokenRejection::Missing)),
        }
    }

    /// Validates a raw `Authorization: Bearer <token>` header.
    pub fn validate_bearer(&self, authorization: Option<&str>, now: i64) -> Result<AccessClaims, AuthError> {
        let token = authorization
            .map(str::trim)
            .and_then(|value| value.strip_prefix(AUTHORIZATION_BEARER_PREFIX));
        match token {
            Some(token) => self.validate(token, now),
            None => Err(AuthError::AuthorizationFailed(TokenRejection::Missing)),
        }
    }
}

/// Finds `name=value` in a `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}
