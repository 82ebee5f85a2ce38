//! Account identity model and registration validation.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Minimum username length in characters.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 32;
/// Minimum password length in characters.
pub const PASSWORD_MIN: usize = 8;
/// Maximum email length in bytes.
const EMAIL_MAX: usize = 254;

/// Validation errors raised while building account values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Email was blank after trimming.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not look like `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Username was shorter than [`USERNAME_MIN`].
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    /// Username was longer than [`USERNAME_MAX`].
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    /// Username contained characters outside `[A-Za-z0-9_]`.
    #[error("username may only contain letters, numbers, or underscores")]
    UsernameInvalidCharacters,
    /// Password was shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

impl AccountValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::UsernameTooShort { .. }
            | Self::UsernameTooLong { .. }
            | Self::UsernameInvalidCharacters => "username",
            Self::PasswordTooShort { .. } => "password",
        }
    }

    /// Machine-readable validation code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "empty_email",
            Self::InvalidEmail => "invalid_email",
            Self::UsernameTooShort { .. } => "username_too_short",
            Self::UsernameTooLong { .. } => "username_too_long",
            Self::UsernameInvalidCharacters => "username_invalid_characters",
            Self::PasswordTooShort { .. } => "password_too_short",
        }
    }
}

/// Database-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(i64);

impl AccountId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalised email address.
///
/// ## Invariants
/// - Trimmed and lower-cased.
/// - Exactly one `@`, a non-empty local part, and a dotted domain whose
///   labels are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use upvote::domain::Email;
    ///
    /// let email = Email::new("  Alice@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "alice@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if trimmed.len() > EMAIL_MAX || trimmed.chars().any(char::is_whitespace) {
            return Err(AccountValidationError::InvalidEmail);
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AccountValidationError::InvalidEmail);
        };
        let domain_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());
        if local.is_empty() || domain.contains('@') || !domain_ok {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public handle chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a username: 3 to 32 characters of `[A-Za-z0-9_]`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < USERNAME_MIN {
            return Err(AccountValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(AccountValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AccountValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered account. The password hash never leaves the persistence
/// boundary through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

/// Validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    email: Email,
    username: Username,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw registration inputs.
    ///
    /// # Examples
    /// ```
    /// use upvote::domain::Registration;
    ///
    /// let registration = Registration::try_from_parts("a@x.io", "alice", "hunter22")
    ///     .expect("valid registration");
    /// assert_eq!(registration.username().as_ref(), "alice");
    /// ```
    pub fn try_from_parts(
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AccountValidationError> {
        let email = Email::new(email)?;
        let username = Username::new(username)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(AccountValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            email,
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
