use serde::{Deserialize, Serialize};

/// An account allowed to sign in to the web interface and API.
///
/// `password` holds the encoded salted hash, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Signed token payload. Times are UNIX seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Not-before, which is also the issue time.
    pub nbf: i64,
    pub exp: i64,
    /// Account identifier.
    pub sub: String,
}

impl AccessClaims {
    /// Parses the subject back into an account identifier.
    pub fn account_id(&self) -> Option<i64> {
        self.sub.trim().parse().ok()
    }
}
