use std::fmt;

use jsonwebtoken::Algorithm;

use crate::{AuthError, SecretString};

/// Minimum required length for the signing secret in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Signing configuration shared by the codec and the email action issuer.
#[derive(Clone)]
pub struct JwtConfig {
    pub(crate) secret: SecretString,
    /// HS256, HS384 or HS512. Default: HS256.
    pub(crate) algorithm: Algorithm,
    pub(crate) issuer: Option<String>,
    pub(crate) audience: Option<String>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtConfig {
    /// Creates a HS256 configuration.
    ///
    /// # Errors
    /// Returns `AuthError::ConfigurationError` if the secret is shorter than 32 bytes.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();

        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthError::ConfigurationError(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            secret: SecretString::new(secret),
            algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
        })
    }

    /// Only the symmetric HMAC family is accepted.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, AuthError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                self.algorithm = algorithm;
                Ok(self)
            }
            other => Err(AuthError::ConfigurationError(format!(
                "unsupported signing algorithm {other:?}, expected HS256, HS384 or HS512"
            ))),
        }
    }

    /// Parses an algorithm name such as `"HS256"`.
    pub fn with_algorithm_name(self, name: &str) -> Result<Self, AuthError> {
        let algorithm = name.parse::<Algorithm>().map_err(|_| {
            AuthError::ConfigurationError(format!("unknown signing algorithm {name:?}"))
        })?;
        self.with_algorithm(algorithm)
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}
