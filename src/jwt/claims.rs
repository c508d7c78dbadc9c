use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Purpose a signed token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived bearer token for API requests.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
    /// Single-use link proving ownership of an email address.
    VerifyEmail,
    /// Single-use link allowing a new password to be set.
    ResetPassword,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::VerifyEmail => "verify_email",
            Self::ResetPassword => "reset_password",
        }
    }

    /// Email action tokens are single-use and carried in links.
    pub fn is_email_action(self) -> bool {
        matches!(self, Self::VerifyEmail | Self::ResetPassword)
    }
}

/// Claims embedded in every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the account id.
    pub sub: String,
    pub kind: TokenKind,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds). Always greater than `iat`.
    pub exp: i64,
    /// Unique token id used for rotation, denylisting and replay tracking.
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    pub fn account_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }

    pub fn issued_at(&self) -> Result<DateTime<Utc>, AuthError> {
        DateTime::from_timestamp(self.iat, 0).ok_or(AuthError::Malformed)
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, AuthError> {
        DateTime::from_timestamp(self.exp, 0).ok_or(AuthError::Malformed)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_owned(),
            kind: TokenKind::Access,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            jti: "jti".to_owned(),
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TokenKind::ResetPassword).unwrap();
        assert_eq!(json, "\"reset_password\"");
        assert_eq!(TokenKind::VerifyEmail.as_str(), "verify_email");
    }

    #[test]
    fn test_email_action_kinds() {
        assert!(TokenKind::VerifyEmail.is_email_action());
        assert!(TokenKind::ResetPassword.is_email_action());
        assert!(!TokenKind::Access.is_email_action());
        assert!(!TokenKind::Refresh.is_email_action());
    }

    #[test]
    fn test_account_id() {
        assert_eq!(claims("42").account_id().unwrap(), 42);
        assert_eq!(claims("alice").account_id(), Err(AuthError::Malformed));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let c = claims("42");
        let at_exp = DateTime::from_timestamp(c.exp, 0).unwrap();
        let before = DateTime::from_timestamp(c.exp - 1, 0).unwrap();
        assert!(c.is_expired_at(at_exp));
        assert!(!c.is_expired_at(before));
    }

    #[test]
    fn test_optional_claims_omitted() {
        let json = serde_json::to_value(claims("1")).unwrap();
        assert!(json.get("iss").is_none());
        assert!(json.get("aud").is_none());
        assert_eq!(json["kind"], "access");
    }
}
