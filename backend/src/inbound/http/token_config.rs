//! Access-token configuration parsing and validation.
//!
//! Centralises the environment-driven signing settings so they are validated
//! consistently and can be tested in isolation. Debug builds fall back to
//! defaults with a warning; release builds demand every toggle explicitly.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::domain::{
    DEFAULT_TOKEN_TTL_MINUTES, TokenAlgorithm, TokenSettings, TokenSettingsError,
};

pub mod fingerprint;

const TOKEN_KEY_DEFAULT_PATH: &str = "/var/run/secrets/auth_key";
const TOKEN_KEY_MIN_LEN: usize = 32;
const EPHEMERAL_KEY_LEN: usize = 64;
const KEY_FILE_ENV: &str = "AUTH_SECRET_KEY_FILE";
const ALLOW_EPHEMERAL_ENV: &str = "AUTH_ALLOW_EPHEMERAL";
const ALGORITHM_ENV: &str = "AUTH_ALGORITHM";
const TTL_ENV: &str = "AUTH_TOKEN_TTL_MINUTES";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const ALGORITHM_EXPECTED: &str = "HS256";
const TTL_EXPECTED: &str = "positive integer minutes";

/// Build mode for token configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use upvote::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the signing key file failed.
    #[error("failed to read token signing key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file exists but is too short for release builds.
    #[error("token signing key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not allow ephemeral signing keys.
    #[error("AUTH_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
    /// Parsed values were rejected when assembling the settings.
    #[error(transparent)]
    Settings(#[from] TokenSettingsError),
}

/// Build token settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use upvote::inbound::http::token_config::{BuildMode, token_settings_from_env};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("auth_key_example");
/// std::fs::write(&key_path, vec![b'a'; 32])?;
///
/// let key_path = key_path.to_string_lossy().into_owned();
/// let mut env = MockEnv::new();
/// env.expect_string()
///     .returning(move |name| match name {
///         "AUTH_SECRET_KEY_FILE" => Some(key_path.clone()),
///         "AUTH_ALLOW_EPHEMERAL" => Some("0".to_owned()),
///         "AUTH_ALGORITHM" => Some("HS256".to_owned()),
///         "AUTH_TOKEN_TTL_MINUTES" => Some("30".to_owned()),
///         _ => None,
///     });
///
/// let settings = token_settings_from_env(&env, BuildMode::Release)?;
/// assert_eq!(settings.ttl().num_minutes(), 30);
///
/// std::fs::remove_file(std::env::temp_dir().join("auth_key_example"))?;
/// # Ok(())
/// # }
/// ```
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let algorithm = algorithm_from_env(env, mode)?;
    let ttl_minutes = ttl_from_env(env, mode)?;
    let key = signing_key_from_env(env, mode, allow_ephemeral)?;
    let key_fingerprint = fingerprint::key_fingerprint(&key);

    let settings = TokenSettings::new(key, algorithm, ttl_minutes)?;
    info!(
        fingerprint = %key_fingerprint,
        algorithm = %algorithm,
        ttl_minutes,
        "token signing key loaded"
    );
    Ok(settings)
}

fn debug_warn_or_error<T, F>(
    mode: BuildMode,
    fallback: T,
    error: TokenConfigError,
    warn_fn: F,
) -> Result<T, TokenConfigError>
where
    F: FnOnce(),
{
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return debug_warn_or_error(
            mode,
            false,
            TokenConfigError::MissingEnv {
                name: ALLOW_EPHEMERAL_ENV,
            },
            || warn!("{ALLOW_EPHEMERAL_ENV} not set; defaulting to disabled"),
        );
    };
    match parse_bool(&value) {
        Some(true) if !mode.is_debug() => Err(TokenConfigError::EphemeralNotAllowed),
        Some(flag) => Ok(flag),
        None => debug_warn_or_error(
            mode,
            false,
            TokenConfigError::InvalidEnv {
                name: ALLOW_EPHEMERAL_ENV,
                value: value.clone(),
                expected: BOOL_EXPECTED,
            },
            || warn!(value = %value, "invalid {ALLOW_EPHEMERAL_ENV}; defaulting to disabled"),
        ),
    }
}

fn algorithm_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenAlgorithm, TokenConfigError> {
    let Some(value) = env.string(ALGORITHM_ENV) else {
        return debug_warn_or_error(
            mode,
            TokenAlgorithm::default(),
            TokenConfigError::MissingEnv {
                name: ALGORITHM_ENV,
            },
            || warn!("{ALGORITHM_ENV} not set; defaulting to {ALGORITHM_EXPECTED}"),
        );
    };
    match value.parse::<TokenAlgorithm>() {
        Ok(algorithm) => Ok(algorithm),
        Err(_) => debug_warn_or_error(
            mode,
            TokenAlgorithm::default(),
            TokenConfigError::InvalidEnv {
                name: ALGORITHM_ENV,
                value: value.clone(),
                expected: ALGORITHM_EXPECTED,
            },
            || warn!(value = %value, "unsupported {ALGORITHM_ENV}; defaulting to {ALGORITHM_EXPECTED}"),
        ),
    }
}

fn ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<u32, TokenConfigError> {
    let Some(value) = env.string(TTL_ENV) else {
        return debug_warn_or_error(
            mode,
            DEFAULT_TOKEN_TTL_MINUTES,
            TokenConfigError::MissingEnv { name: TTL_ENV },
            || warn!("{TTL_ENV} not set; defaulting to {DEFAULT_TOKEN_TTL_MINUTES} minutes"),
        );
    };
    match value.trim().parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => debug_warn_or_error(
            mode,
            DEFAULT_TOKEN_TTL_MINUTES,
            TokenConfigError::InvalidEnv {
                name: TTL_ENV,
                value: value.clone(),
                expected: TTL_EXPECTED,
            },
            || {
                warn!(
                    value = %value,
                    "invalid {TTL_ENV}; defaulting to {DEFAULT_TOKEN_TTL_MINUTES} minutes"
                );
            },
        ),
    }
}

fn signing_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Vec<u8>, TokenConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| TOKEN_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < TOKEN_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(TokenConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: TOKEN_KEY_MIN_LEN,
                });
            }
            Ok(bytes)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary token signing key (dev only)"
                );
                let mut key = vec![0_u8; EPHEMERAL_KEY_LEN];
                OsRng.fill_bytes(&mut key);
                Ok(key)
            } else {
                Err(TokenConfigError::KeyRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
