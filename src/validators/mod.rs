//! Input validation applied before credentials reach storage.

mod password;

pub use password::PasswordPolicy;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    PasswordEmpty,
    PasswordTooShort(usize),
    PasswordTooLong(usize),
    PasswordMissingLetter,
    PasswordMissingDigit,
    PasswordMissingSymbol,
    PasswordDenied,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
            Self::PasswordTooShort(min) => write!(f, "Password must be at least {min} characters"),
            Self::PasswordTooLong(max) => write!(f, "Password is too long (max {max} characters)"),
            Self::PasswordMissingLetter => write!(f, "Password must contain a letter"),
            Self::PasswordMissingDigit => write!(f, "Password must contain a digit"),
            Self::PasswordMissingSymbol => write!(f, "Password must contain a symbol"),
            Self::PasswordDenied => write!(f, "Password is too common"),
        }
    }
}

impl std::error::Error for ValidationError {}
