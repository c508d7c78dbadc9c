use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use super::{Claims, JwtConfig, TokenKind};
use crate::crypto::generate_jti;
use crate::{AuthError, SecretString};

/// Access and refresh tokens handed to a client after login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    /// Opaque server-side refresh token.
    pub refresh_token: SecretString,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    pub(crate) fn bearer(access_token: String, refresh_token: SecretString, expires_in: Duration) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in: expires_in.num_seconds(),
        }
    }
}

/// Stateless signed token codec.
///
/// Tokens are JWTs: three dot-separated base64url segments carrying the
/// header, the [`Claims`] and an HMAC tag.
#[derive(Clone)]
pub struct JwtCodec {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtCodec {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.expose_secret().as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Signs `claims`.
    ///
    /// Fails with `Malformed` when `exp <= iat`.
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        if claims.exp <= claims.iat {
            return Err(AuthError::Malformed);
        }

        jsonwebtoken::encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(|_| AuthError::Malformed)
    }

    /// Builds fresh claims for `account_id` and signs them.
    ///
    /// Fails with `Malformed` when `ttl` pushes the expiry out of range.
    pub fn mint(
        &self,
        account_id: i64,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, Claims), AuthError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(AuthError::Malformed)?;
        let claims = Claims {
            sub: account_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: generate_jti(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    /// Verifies the tag, then the expiry, and returns the claims.
    ///
    /// - `InvalidSignature`: tag mismatch, foreign algorithm, issuer or audience
    /// - `Malformed`: not a parseable token or claims
    /// - `Expired`: `now >= exp`
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.config.algorithm);
        // expiry is checked below with an inclusive bound and no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        if let Some(ref iss) = self.config.issuer {
            validation.set_issuer(&[iss]);
        }

        if let Some(ref aud) = self.config.audience {
            validation.set_audience(&[aud]);
        }

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })?
            .claims;

        if claims.exp <= claims.iat {
            return Err(AuthError::Malformed);
        }

        if claims.is_expired_at(Utc::now()) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> JwtCodec {
        JwtCodec::new(JwtConfig::new(secret).unwrap())
    }

    fn claims_at(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: "42".to_owned(),
            kind: TokenKind::Access,
            iat,
            exp,
            jti: generate_jti(),
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = codec("test-secret-32-bytes-long-key-01");
        let now = Utc::now().timestamp();
        let claims = claims_at(now, now + 900);

        let token = codec.encode(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_round_trip_every_kind() {
        let codec = codec("test-secret-32-bytes-long-key-02");
        for kind in [
            TokenKind::Access,
            TokenKind::Refresh,
            TokenKind::VerifyEmail,
            TokenKind::ResetPassword,
        ] {
            let (token, claims) = codec.mint(7, kind, Duration::minutes(5)).unwrap();
            let decoded = codec.decode(&token).unwrap();
            assert_eq!(decoded, claims);
            assert_eq!(decoded.kind, kind);
            assert_eq!(decoded.account_id().unwrap(), 7);
        }
    }

    #[test]
    fn test_wrong_secret() {
        let signer = codec("test-secret-32-bytes-long-key-03");
        let verifier = codec("test-secret-32-bytes-long-key-04");

        let (token, _) = signer.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_eq!(verifier.decode(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec("test-secret-32-bytes-long-key-05");
        let (token, _) = codec.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();
        let (other, _) = codec.mint(1, TokenKind::Access, Duration::minutes(5)).unwrap();

        // splice the payload of one token onto the signature of another
        let mut parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        parts[1] = other_parts[1];
        let forged = parts.join(".");

        assert_eq!(codec.decode(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_malformed() {
        let codec = codec("test-secret-32-bytes-long-key-06");
        assert_eq!(codec.decode("not-a-token"), Err(AuthError::Malformed));
        assert_eq!(codec.decode(""), Err(AuthError::Malformed));
    }

    #[test]
    fn test_expired() {
        let codec = codec("test-secret-32-bytes-long-key-07");
        let now = Utc::now().timestamp();
        let token = codec.encode(&claims_at(now - 7200, now - 3600)).unwrap();

        assert_eq!(codec.decode(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_expired_at_exact_expiry() {
        let codec = codec("test-secret-32-bytes-long-key-08");
        let now = Utc::now().timestamp();
        let token = codec.encode(&claims_at(now - 60, now)).unwrap();

        assert_eq!(codec.decode(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_encode_rejects_inverted_window() {
        let codec = codec("test-secret-32-bytes-long-key-09");
        let now = Utc::now().timestamp();
        assert_eq!(codec.encode(&claims_at(now, now)), Err(AuthError::Malformed));
        assert!(codec.mint(1, TokenKind::Access, Duration::zero()).is_err());
    }

    #[test]
    fn test_mint_rejects_unrepresentable_ttl() {
        let codec = codec("test-secret-32-bytes-long-key-10");
        let result = codec.mint(42, TokenKind::Access, Duration::days(1_000_000_000));
        assert_eq!(result.err(), Some(AuthError::Malformed));
    }

    #[test]
    fn test_algorithm_mismatch_is_invalid_signature() {
        let config = JwtConfig::new("test-secret-32-bytes-long-key-10").unwrap();
        let hs512 = JwtCodec::new(config.clone().with_algorithm_name("HS512").unwrap());
        let hs256 = JwtCodec::new(config);

        let (token, _) = hs512.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_eq!(hs256.decode(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_issuer_and_audience() {
        let config = JwtConfig::new("test-secret-32-bytes-long-key-11")
            .unwrap()
            .with_issuer("tessera")
            .with_audience("contacts-api");
        let codec = JwtCodec::new(config.clone());
        let (token, _) = codec.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("tessera"));
        assert_eq!(claims.aud.as_deref(), Some("contacts-api"));

        let other = JwtCodec::new(config.with_audience("billing-api"));
        assert_eq!(other.decode(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_jti_unique_per_mint() {
        let codec = codec("test-secret-32-bytes-long-key-12");
        let (_, a) = codec.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();
        let (_, b) = codec.mint(42, TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_ne!(a.jti, b.jti);
        assert!(a.exp > a.iat);
    }
}
