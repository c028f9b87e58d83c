//! Email and password accounts.
//!
//! Credentials are validated here before a handler talks to the
//! [`AccountService`](crate::domain::ports::AccountService) port. Passwords
//! are held in [`Zeroizing`] buffers and only ever stored as Argon2 digests.

use std::fmt;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::{Actor, UserId, UserValidationError, Username};

/// Longest accepted email address.
pub const EMAIL_MAX: usize = 254;
/// Shortest accepted sign-up password.
pub const PASSWORD_MIN: usize = 8;
/// Longest accepted sign-up password.
pub const PASSWORD_MAX: usize = 72;

const SALT_LEN: usize = 16;

/// Validation errors raised by the credential constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// Email was blank once trimmed.
    EmptyEmail,
    /// Email lacked a local part or a dotted domain.
    InvalidEmail,
    /// Email exceeded [`EMAIL_MAX`] characters.
    EmailTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Password was empty.
    EmptyPassword,
    /// Sign-up password was shorter than [`PASSWORD_MIN`].
    PasswordTooShort {
        /// Minimum permitted length.
        min: usize,
    },
    /// Sign-up password was longer than [`PASSWORD_MAX`].
    PasswordTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Username failed validation.
    Username(UserValidationError),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like name@example.com"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
            Self::Username(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Trimmed, lowercased email address used as the sign-in identifier.
///
/// # Examples
/// ```
/// use addon_backend::domain::Email;
///
/// let email = Email::new("  Climber@Example.COM ").expect("valid email");
/// assert_eq!(email.as_ref(), "climber@example.com");
/// assert!(Email::new("climber@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(AccountValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let Some((local, domain)) = normalised.rsplit_once('@') else {
            return Err(AccountValidationError::InvalidEmail);
        };
        let dotted = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if local.is_empty() || !dotted || normalised.chars().any(char::is_whitespace) {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Caller-supplied password. Whitespace is kept as typed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Password for a new account, length-checked.
    pub fn for_sign_up(raw: &str) -> Result<Self, AccountValidationError> {
        let length = raw.chars().count();
        if length == 0 {
            return Err(AccountValidationError::EmptyPassword);
        }
        if length < PASSWORD_MIN {
            return Err(AccountValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(AccountValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Password offered at sign-in; only emptiness is checked.
    pub fn for_sign_in(raw: &str) -> Result<Self, AccountValidationError> {
        if raw.is_empty() {
            return Err(AccountValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plain-text password.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Argon2 digest in PHC string form.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash `password` under a fresh random salt. Blocking.
    pub fn hash(password: &Password) -> Result<Self, argon2::password_hash::Error> {
        let mut salt = [0_u8; SALT_LEN];
        rand::thread_rng().fill(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;
        let digest = Argon2::default().hash_password(password.expose().as_bytes(), &salt)?;
        Ok(Self(digest.to_string()))
    }

    /// Wrap a digest loaded from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Whether `password` matches. Malformed digests never match.
    pub fn verify(&self, password: &Password) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.expose().as_bytes(), &parsed)
                .is_ok()
        })
    }

    /// PHC string for storage.
    pub fn as_phc(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

/// Validated sign-up form.
#[derive(Debug, Clone)]
pub struct SignUpCredentials {
    /// Sign-in identifier.
    pub email: Email,
    /// Chosen password.
    pub password: Password,
    /// Display name for games.
    pub username: Username,
}

impl SignUpCredentials {
    /// Validate raw form fields.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Self, AccountValidationError> {
        Ok(Self {
            email: Email::new(email)?,
            password: Password::for_sign_up(password)?,
            username: Username::new(username).map_err(AccountValidationError::Username)?,
        })
    }
}

/// Validated sign-in form.
#[derive(Debug, Clone)]
pub struct SignInCredentials {
    /// Sign-in identifier.
    pub email: Email,
    /// Offered password.
    pub password: Password,
}

impl SignInCredentials {
    /// Validate raw form fields.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AccountValidationError> {
        Ok(Self {
            email: Email::new(email)?,
            password: Password::for_sign_in(password)?,
        })
    }
}

/// Registered account as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id; also the player id in games.
    pub id: UserId,
    /// Sign-in identifier.
    pub email: Email,
    /// Display name.
    pub username: Username,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Identity for engine calls made by this account.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.username.clone())
    }
}

/// Insert payload for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Pre-generated account id.
    pub id: UserId,
    /// Sign-in identifier; unique.
    pub email: Email,
    /// Display name.
    pub username: Username,
    /// Hashed password.
    pub password_digest: PasswordDigest,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Account row together with its password digest.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    /// Public account fields.
    pub account: Account,
    /// Hashed password.
    pub password_digest: PasswordDigest,
}

impl From<NewAccount> for StoredAccount {
    fn from(value: NewAccount) -> Self {
        Self {
            account: Account {
                id: value.id,
                email: value.email,
                username: value.username,
                created_at: value.created_at,
            },
            password_digest: value.password_digest,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for credential validation and hashing.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", AccountValidationError::EmptyEmail)]
    #[case("   ", AccountValidationError::EmptyEmail)]
    #[case("no-at-sign", AccountValidationError::InvalidEmail)]
    #[case("@example.com", AccountValidationError::InvalidEmail)]
    #[case("climber@localhost", AccountValidationError::InvalidEmail)]
    #[case("climber@example.", AccountValidationError::InvalidEmail)]
    #[case("two words@example.com", AccountValidationError::InvalidEmail)]
    fn malformed_emails_are_rejected(#[case] raw: &str, #[case] expected: AccountValidationError) {
        assert_eq!(Email::new(raw), Err(expected));
    }

    #[rstest]
    fn overlong_emails_are_rejected() {
        let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX));
        assert_eq!(
            Email::new(raw),
            Err(AccountValidationError::EmailTooLong { max: EMAIL_MAX })
        );
    }

    #[rstest]
    #[case("", AccountValidationError::EmptyPassword)]
    #[case("short", AccountValidationError::PasswordTooShort { min: PASSWORD_MIN })]
    fn weak_sign_up_passwords_are_rejected(
        #[case] raw: &str,
        #[case] expected: AccountValidationError,
    ) {
        assert_eq!(Password::for_sign_up(raw).map(|_| ()), Err(expected));
    }

    #[rstest]
    fn sign_in_accepts_any_non_empty_password() {
        assert!(Password::for_sign_in("x").is_ok());
        assert!(Password::for_sign_in("").is_err());
    }

    #[rstest]
    fn sign_up_reports_username_problems() {
        let err = SignUpCredentials::try_from_parts("a@b.co", "long enough", " ")
            .expect_err("blank username");
        assert_eq!(
            err,
            AccountValidationError::Username(UserValidationError::EmptyUsername)
        );
    }

    #[rstest]
    fn digests_verify_only_the_original_password() {
        let password = Password::for_sign_up("correct horse").expect("valid");
        let digest = PasswordDigest::hash(&password).expect("hashed");

        assert!(digest.as_phc().starts_with("$argon2"));
        assert!(digest.verify(&password));
        assert!(!digest.verify(&Password::for_sign_in("wrong horse").expect("valid")));
        assert!(!PasswordDigest::from_phc("not a phc string").verify(&password));
    }

    #[rstest]
    fn secrets_stay_out_of_debug_output() {
        let password = Password::for_sign_in("hunter22").expect("valid");
        assert!(!format!("{password:?}").contains("hunter22"));
    }
}
