//! Password hashing and signed access tokens.
//!
//! Passwords are stored as salted Argon2id PHC strings. Access tokens use the
//! compact `header.claims.signature` layout with base64url segments and an
//! HMAC-SHA256 signature over the first two segments. Verification never
//! touches storage.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use mockable::Clock;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;
use zeroize::Zeroizing;

use super::{AccessToken, AccountId};

type HmacSha256 = Hmac<Sha256>;

/// Default access-token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 30;

/// Supported token signing algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenAlgorithm {
    #[default]
    Hs256,
}

impl TokenAlgorithm {
    /// Name written into the token header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
        }
    }
}

impl fmt::Display for TokenAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an algorithm name is not supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported token algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for TokenAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("HS256") {
            Ok(Self::Hs256)
        } else {
            Err(UnsupportedAlgorithm(s.to_owned()))
        }
    }
}

/// Errors raised while assembling [`TokenSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenSettingsError {
    #[error("token signing key must not be empty")]
    EmptySecret,
    #[error("token lifetime must be at least one minute")]
    ZeroTtl,
}

/// Immutable signing configuration injected into [`CredentialService`].
#[derive(Clone)]
pub struct TokenSettings {
    secret: Zeroizing<Vec<u8>>,
    algorithm: TokenAlgorithm,
    ttl: TimeDelta,
}

impl TokenSettings {
    /// Build settings from key material, algorithm, and lifetime.
    ///
    /// # Examples
    /// ```
    /// use upvote::domain::{TokenAlgorithm, TokenSettings};
    ///
    /// let settings = TokenSettings::new(vec![7; 32], TokenAlgorithm::Hs256, 30)
    ///     .expect("valid settings");
    /// assert_eq!(settings.ttl().num_minutes(), 30);
    /// ```
    pub fn new(
        secret: Vec<u8>,
        algorithm: TokenAlgorithm,
        ttl_minutes: u32,
    ) -> Result<Self, TokenSettingsError> {
        let secret = Zeroizing::new(secret);
        if secret.is_empty() {
            return Err(TokenSettingsError::EmptySecret);
        }
        if ttl_minutes == 0 {
            return Err(TokenSettingsError::ZeroTtl);
        }
        Ok(Self {
            secret,
            algorithm,
            ttl: TimeDelta::minutes(i64::from(ttl_minutes)),
        })
    }

    pub fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.as_slice()
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Failures while hashing passwords or minting tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token algorithm does not match the configured algorithm")]
    AlgorithmMismatch,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Hashes and verifies passwords; issues and verifies access tokens.
#[derive(Clone)]
pub struct CredentialService {
    settings: TokenSettings,
    hasher: Argon2<'static>,
    clock: Arc<dyn Clock>,
}

impl CredentialService {
    /// Create a service using Argon2id with the crate's default cost.
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self::with_hash_params(settings, clock, Params::default())
    }

    /// Create a service with explicit Argon2 cost parameters.
    pub fn with_hash_params(
        settings: TokenSettings,
        clock: Arc<dyn Clock>,
        params: Params,
    ) -> Self {
        Self {
            settings,
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            clock,
        }
    }

    /// Produce a salted PHC hash string for `password`.
    pub fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hashing(err.to_string()))
    }

    /// Check `password` against a stored PHC hash.
    ///
    /// A stored hash that cannot be parsed verifies as `false`.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "stored password hash is malformed");
                return false;
            }
        };
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Issue a token for `account_id` at the current clock instant.
    pub fn issue(&self, account_id: AccountId) -> Result<AccessToken, CredentialError> {
        self.issue_token(account_id, self.clock.utc())
    }

    /// Issue a token for `account_id` valid from `issued_at` for the
    /// configured lifetime.
    pub fn issue_token(
        &self,
        account_id: AccountId,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, CredentialError> {
        let expires_at = issued_at + self.settings.ttl;
        let header = Header {
            alg: self.settings.algorithm.as_str().to_owned(),
            typ: "JWT".to_owned(),
        };
        let claims = Claims {
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let header = encode_segment(&header)?;
        let claims = encode_segment(&claims)?;
        let signing_input = format!("{header}.{claims}");
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();
        let token = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature));
        Ok(AccessToken::new(token, expires_at))
    }

    /// Verify a token against the current clock instant.
    pub fn verify(&self, token: &str) -> Result<AccountId, TokenError> {
        self.verify_token(token, self.clock.utc())
    }

    /// Verify signature, algorithm, and expiry, returning the subject.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, TokenError> {
        let mut segments = token.split('.');
        let (Some(header_segment), Some(claims), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_segment(header_segment)?;
        if header.alg != self.settings.algorithm.as_str() {
            return Err(TokenError::AlgorithmMismatch);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input = format!("{header_segment}.{claims}");
        self.mac(signing_input.as_bytes())
            .map_err(|_| TokenError::BadSignature)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = decode_segment(claims)?;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        let subject = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)?;
        Ok(AccountId::new(subject))
    }

    fn mac(&self, signing_input: &[u8]) -> Result<HmacSha256, CredentialError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.settings.secret())
            .map_err(|err| CredentialError::Signing(err.to_string()))?;
        mac.update(signing_input);
        Ok(mac)
    }
}

impl fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, CredentialError> {
    let json = serde_json::to_vec(value).map_err(|err| CredentialError::Signing(err.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
