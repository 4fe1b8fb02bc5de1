use std::fmt;

// === BookmarkError ===

/// Errors returned by bookmark lifecycle operations and the bookmark store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkError {
    /// The submitted URL is not an absolute URL with a host.
    InvalidUrl(String),
    /// An index is not a non-negative integer.
    InvalidIndex(String),
    /// No bookmark matches one or more of the requested indices.
    NotFound(String),
    /// Media download failed after the bookmark was saved.
    DownloadFailed(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::InvalidUrl(url) => write!(f, "URL is not valid: {}", url),
            BookmarkError::InvalidIndex(index) => write!(f, "Index is not valid: {}", index),
            BookmarkError::NotFound(msg) => write!(f, "No matching index found: {}", msg),
            BookmarkError::DownloadFailed(msg) => write!(f, "Video download failed: {}", msg),
            BookmarkError::DatabaseError(msg) => {
                write!(f, "Bookmark database error: {}", msg)
            }
        }
    }
}

impl std::error::Error for BookmarkError {}

impl From<rusqlite::Error> for BookmarkError {
    fn from(err: rusqlite::Error) -> Self {
        BookmarkError::DatabaseError(err.to_string())
    }
}

// === FetchError ===

/// Errors from the content extractor. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The extractor did not answer within the allowed time.
    Timeout(u64),
    /// The page could not be retrieved.
    Network(String),
    /// The page was retrieved but could not be parsed.
    Extraction(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout(secs) => write!(f, "Fetch timed out after {}s", secs),
            FetchError::Network(msg) => write!(f, "Fetch network error: {}", msg),
            FetchError::Extraction(msg) => write!(f, "Content extraction failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

// === DownloadError ===

/// Errors related to resolving and downloading video media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// The video page could not be resolved into encodings.
    ResolveFailed(String),
    /// No encoding satisfies the audio and container requirements.
    NoSuitableFormat(String),
    /// A network error occurred during download.
    NetworkError(String),
    /// A file system error occurred.
    FileSystemError(String),
}

impl DownloadError {
    /// Returns true when the failure leaves the bookmark usable without media.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DownloadError::ResolveFailed(_) | DownloadError::NoSuitableFormat(_)
        )
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::ResolveFailed(msg) => write!(f, "Video resolve failed: {}", msg),
            DownloadError::NoSuitableFormat(url) => {
                write!(f, "No suitable video format: {}", url)
            }
            DownloadError::NetworkError(msg) => write!(f, "Download network error: {}", msg),
            DownloadError::FileSystemError(msg) => {
                write!(f, "Download file system error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DownloadError {}

// === AuthError ===

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// No token was presented.
    Missing,
    /// The token could not be decoded.
    Malformed,
    /// The token header names an algorithm other than HS256.
    UnexpectedAlgorithm,
    /// The signature does not match the process signing key.
    BadSignature,
    /// The not-before time is in the future.
    NotYetValid,
    /// The expiry time has passed.
    Expired,
    /// The subject claim is empty or not an account identifier.
    MissingSubject,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TokenRejection::Missing => "token does not exist",
            TokenRejection::Malformed => "token is malformed",
            TokenRejection::UnexpectedAlgorithm => "unexpected signing method",
            TokenRejection::BadSignature => "signature is invalid",
            TokenRejection::NotYetValid => "token is not valid yet",
            TokenRejection::Expired => "token is expired",
            TokenRejection::MissingSubject => "token has no subject",
        };
        f.write_str(reason)
    }
}

/// Errors related to login and token validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password. Deliberately indistinguishable.
    AuthenticationFailed,
    /// A token was missing or rejected.
    AuthorizationFailed(TokenRejection),
    /// Token signing failed.
    SigningFailed(String),
    /// Account lookup failed.
    DatabaseError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::AuthenticationFailed => {
                write!(f, "Username and password don't match")
            }
            AuthError::AuthorizationFailed(reason) => {
                write!(f, "Authorization failed: {}", reason)
            }
            AuthError::SigningFailed(msg) => write!(f, "Token signing failed: {}", msg),
            AuthError::DatabaseError(msg) => write!(f, "Account database error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Failed to generate random bytes.
    RandomGeneration(String),
    /// A stored password hash could not be parsed.
    InvalidHash(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            CryptoError::InvalidHash(msg) => write!(f, "Invalid password hash: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
