//! Unit tests for token configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug)]
struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("auth-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'a'; len])?;
        Ok(Self { path })
    }

    fn path_str(&self) -> &str {
        self.path
            .to_str()
            .expect("temporary path should be valid UTF-8")
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn mock_env(vars: HashMap<String, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_defaults(key_path: &str) -> HashMap<String, String> {
    HashMap::from([
        (KEY_FILE_ENV.to_owned(), key_path.to_owned()),
        (ALLOW_EPHEMERAL_ENV.to_owned(), "0".to_owned()),
        (ALGORITHM_ENV.to_owned(), "HS256".to_owned()),
        (TTL_ENV.to_owned(), "45".to_owned()),
    ])
}

fn missing_key_path() -> String {
    std::env::temp_dir()
        .join(format!("auth-key-missing-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned()
}

fn expect_error(result: Result<TokenSettings, TokenConfigError>, label: &str) -> TokenConfigError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

#[rstest]
fn release_valid_settings_succeed() {
    let key_file = TempKeyFile::new(TOKEN_KEY_MIN_LEN).expect("key file creation should succeed");
    let env = mock_env(release_defaults(key_file.path_str()));

    let settings =
        token_settings_from_env(&env, BuildMode::Release).expect("expected valid settings");
    assert_eq!(settings.algorithm(), TokenAlgorithm::Hs256);
    assert_eq!(settings.ttl().num_minutes(), 45);
    assert_eq!(settings.secret(), vec![b'a'; TOKEN_KEY_MIN_LEN].as_slice());
}

#[rstest]
#[case(ALLOW_EPHEMERAL_ENV)]
#[case(ALGORITHM_ENV)]
#[case(TTL_ENV)]
fn release_missing_toggle_is_rejected(#[case] name: &'static str) {
    let key_file = TempKeyFile::new(TOKEN_KEY_MIN_LEN).expect("key file creation should succeed");
    let mut vars = release_defaults(key_file.path_str());
    vars.remove(name);
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected missing toggle to fail",
    );
    assert!(matches!(err, TokenConfigError::MissingEnv { name: missing } if missing == name));
}

#[rstest]
#[case(ALLOW_EPHEMERAL_ENV, "maybe")]
#[case(ALGORITHM_ENV, "RS256")]
#[case(ALGORITHM_ENV, "none")]
#[case(TTL_ENV, "0")]
#[case(TTL_ENV, "-5")]
#[case(TTL_ENV, "half an hour")]
fn release_invalid_toggle_is_rejected(#[case] name: &'static str, #[case] value: &str) {
    let key_file = TempKeyFile::new(TOKEN_KEY_MIN_LEN).expect("key file creation should succeed");
    let mut vars = release_defaults(key_file.path_str());
    vars.insert(name.to_owned(), value.to_owned());
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected invalid toggle to fail",
    );
    assert!(matches!(err, TokenConfigError::InvalidEnv { name: invalid, .. } if invalid == name));
}

#[rstest]
fn release_ephemeral_enabled_is_rejected() {
    let key_file = TempKeyFile::new(TOKEN_KEY_MIN_LEN).expect("key file creation should succeed");
    let mut vars = release_defaults(key_file.path_str());
    vars.insert(ALLOW_EPHEMERAL_ENV.to_owned(), "1".to_owned());
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected ephemeral to be rejected in release",
    );
    assert!(matches!(err, TokenConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_missing_key_file_is_rejected() {
    let missing = missing_key_path();
    let env = mock_env(release_defaults(&missing));

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected missing key file to fail",
    );
    assert!(matches!(err, TokenConfigError::KeyRead { .. }));
}

#[rstest]
fn release_short_key_is_rejected() {
    let key_file = TempKeyFile::new(TOKEN_KEY_MIN_LEN - 1).expect("key file creation should succeed");
    let env = mock_env(release_defaults(key_file.path_str()));

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected short key to fail",
    );
    assert!(matches!(
        err,
        TokenConfigError::KeyTooShort {
            length: 31,
            min_len: TOKEN_KEY_MIN_LEN,
            ..
        }
    ));
}

#[rstest]
fn debug_defaults_generate_ephemeral_key() {
    let mut vars = HashMap::new();
    vars.insert(KEY_FILE_ENV.to_owned(), missing_key_path());
    let env = mock_env(vars);

    let settings =
        token_settings_from_env(&env, BuildMode::Debug).expect("debug defaults should succeed");
    assert_eq!(settings.algorithm(), TokenAlgorithm::Hs256);
    assert_eq!(
        settings.ttl().num_minutes(),
        i64::from(DEFAULT_TOKEN_TTL_MINUTES)
    );
    assert_eq!(settings.secret().len(), EPHEMERAL_KEY_LEN);
}

#[rstest]
fn debug_invalid_values_fall_back_to_defaults() {
    let key_file = TempKeyFile::new(8).expect("key file creation should succeed");
    let mut vars = release_defaults(key_file.path_str());
    vars.insert(ALGORITHM_ENV.to_owned(), "ES512".to_owned());
    vars.insert(TTL_ENV.to_owned(), "soon".to_owned());
    let env = mock_env(vars);

    let settings =
        token_settings_from_env(&env, BuildMode::Debug).expect("debug should fall back");
    assert_eq!(settings.algorithm(), TokenAlgorithm::Hs256);
    assert_eq!(
        settings.ttl().num_minutes(),
        i64::from(DEFAULT_TOKEN_TTL_MINUTES)
    );
    assert_eq!(settings.secret().len(), 8, "short keys are tolerated in debug");
}

#[rstest]
fn empty_key_file_is_rejected_even_in_debug() {
    let key_file = TempKeyFile::new(0).expect("key file creation should succeed");
    let env = mock_env(release_defaults(key_file.path_str()));

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Debug),
        "expected empty key to fail",
    );
    assert!(matches!(
        err,
        TokenConfigError::Settings(TokenSettingsError::EmptySecret)
    ));
}

#[rstest]
#[case("1", Some(true))]
#[case(" YES ", Some(true))]
#[case("n", Some(false))]
#[case("false", Some(false))]
#[case("perhaps", None)]
fn parses_boolean_toggles(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}
