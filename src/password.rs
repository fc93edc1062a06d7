//! Password strength checks and bcrypt hashing for user accounts.

use bcrypt::{hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A password that is strong enough to register with, not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check that `raw_password` is hard to guess.
    ///
    /// `user_inputs` are the other values from the same registration, e.g.
    /// name and email. A password built from them scores lower.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TooWeak] with zxcvbn's suggestions if the score is
    /// below three, or if the password is longer than [MAX_PASSWORD_BYTES].
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        if raw_password.len() > MAX_PASSWORD_BYTES {
            return Err(Error::TooWeak(format!(
                "passwords may be at most {MAX_PASSWORD_BYTES} bytes long"
            )));
        }

        let analysis = zxcvbn(raw_password, user_inputs);

        if analysis.score() < Score::Three {
            let feedback = analysis.feedback().cloned().unwrap_or_else(Feedback::default);
            return Err(Error::TooWeak(feedback.to_string()));
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Meant for seeding demo data and tests, never for passwords from requests.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

/// A salted bcrypt hash as stored in the user table.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// bcrypt's recommended cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds of bcrypt.
    ///
    /// Each extra point of `cost` doubles the time taken to hash and verify.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if bcrypt fails, e.g. on an out of range cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if the stored hash is not a valid bcrypt hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
