use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Rules a new password must satisfy before it is hashed.
///
/// ```
/// use tessera::validators::PasswordPolicy;
///
/// let policy = PasswordPolicy::default();
/// assert!(policy.validate("correct horse").is_ok());
/// assert!(policy.validate("short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Counted in characters, not bytes. Default: 8
    pub min_length: usize,
    /// Default: 128
    pub max_length: usize,
    pub require_letter: bool,
    pub require_digit: bool,
    /// Any ASCII punctuation character.
    pub require_symbol: bool,
    /// Compared case-insensitively.
    #[serde(default)]
    pub denied: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: false,
            require_digit: false,
            require_symbol: false,
            denied: Vec::new(),
        }
    }
}

impl PasswordPolicy {
    /// 12+ characters with a letter, a digit and a symbol.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min_length: 12,
            require_letter: true,
            require_digit: true,
            require_symbol: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_denied<I, S>(mut self, passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied = passwords.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty);
        }

        let length = password.chars().count();
        if length < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }
        if length > self.max_length {
            return Err(ValidationError::PasswordTooLong(self.max_length));
        }

        if self.require_letter && !password.chars().any(char::is_alphabetic) {
            return Err(ValidationError::PasswordMissingLetter);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordMissingDigit);
        }
        if self.require_symbol && !password.chars().any(|c| c.is_ascii_punctuation()) {
            return Err(ValidationError::PasswordMissingSymbol);
        }

        if self.denied.iter().any(|d| d.eq_ignore_ascii_case(password)) {
            return Err(ValidationError::PasswordDenied);
        }

        Ok(())
    }
}
