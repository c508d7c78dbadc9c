//! Wrapper for raw tokens and signing secrets.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sensitive string that never shows up in `Debug` or `Display` output.
///
/// Raw refresh tokens, email action tokens and the signing secret are all
/// carried as `SecretString` so that logging a record or a config struct
/// cannot leak them.
///
/// ```rust
/// use tessera::SecretString;
///
/// let raw = SecretString::new("rt_4f9a");
/// assert_eq!(format!("{raw:?}"), "SecretString([REDACTED])");
/// assert_eq!(raw.expose_secret(), "rt_4f9a");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Only call this where the value must leave the process (response
    /// bodies, email links) or be hashed.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // token responses need the real value
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}
