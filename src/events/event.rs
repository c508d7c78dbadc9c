use chrono::{DateTime, Utc};

/// Events emitted by the actions.
///
/// Dispatched whether or not listeners are registered; see
/// [`register_event_listeners`](crate::register_event_listeners).
#[derive(Debug, Clone)]
pub enum AuthEvent {
    // sessions
    LoginSucceeded {
        account_id: i64,
        at: DateTime<Utc>,
    },
    LoginFailed {
        login: String,
        reason: &'static str,
        at: DateTime<Utc>,
    },
    LoggedOut {
        account_id: i64,
        at: DateTime<Utc>,
    },

    // refresh tokens
    TokenRefreshed {
        account_id: i64,
        /// jti of the successor record.
        jti: String,
        at: DateTime<Utc>,
    },
    TokenReuseDetected {
        account_id: i64,
        /// jti of the record that was presented again.
        jti: String,
        at: DateTime<Utc>,
    },
    AllTokensRevoked {
        account_id: i64,
        count: u64,
        at: DateTime<Utc>,
    },

    // email actions
    EmailVerificationSent {
        account_id: i64,
        at: DateTime<Utc>,
    },
    EmailVerified {
        account_id: i64,
        at: DateTime<Utc>,
    },
    PasswordResetRequested {
        account_id: i64,
        at: DateTime<Utc>,
    },
    PasswordResetCompleted {
        account_id: i64,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::LoggedOut { .. } => "auth.logout",
            Self::TokenRefreshed { .. } => "auth.token.refreshed",
            Self::TokenReuseDetected { .. } => "auth.token.reuse_detected",
            Self::AllTokensRevoked { .. } => "auth.token.all_revoked",
            Self::EmailVerificationSent { .. } => "auth.email.verification_sent",
            Self::EmailVerified { .. } => "auth.email.verified",
            Self::PasswordResetRequested { .. } => "auth.password.reset_requested",
            Self::PasswordResetCompleted { .. } => "auth.password.reset_completed",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LoggedOut { at, .. }
            | Self::TokenRefreshed { at, .. }
            | Self::TokenReuseDetected { at, .. }
            | Self::AllTokensRevoked { at, .. }
            | Self::EmailVerificationSent { at, .. }
            | Self::EmailVerified { at, .. }
            | Self::PasswordResetRequested { at, .. }
            | Self::PasswordResetCompleted { at, .. } => *at,
        }
    }

    /// Events an operator should look at: failed logins and token reuse.
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            Self::LoginFailed { .. } | Self::TokenReuseDetected { .. }
        )
    }
}
