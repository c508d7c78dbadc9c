//! One struct per operation, collaborators injected through `new`.
//!
//! Every action returns [`AuthError`](crate::AuthError); storage failures are
//! logged and reported as `Internal`.

mod authenticate;
mod forgot_password;
mod login;
mod logout;
mod prune_expired;
mod refresh_token;
mod reset_password;
mod send_verification;
mod verify_email;

pub use authenticate::AuthenticateAction;
pub use forgot_password::{ForgotPasswordAction, ForgotPasswordConfig};
pub use login::{LoginAction, LoginConfig};
pub use logout::LogoutAction;
pub use prune_expired::{PruneExpiredAction, PruneResult};
pub use refresh_token::{RefreshTokenAction, RefreshTokenConfig};
pub use reset_password::ResetPasswordAction;
pub use send_verification::{SendVerificationAction, SendVerificationConfig};
pub use verify_email::VerifyEmailAction;

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]

    use crate::jwt::{EmailActionIssuer, JwtCodec, JwtConfig};
    use crate::repository::InMemoryJtiRegistry;

    pub const SECRET: &str = "test-secret-32-bytes-long-key-ac";

    pub fn codec() -> JwtCodec {
        JwtCodec::new(JwtConfig::new(SECRET).unwrap())
    }

    pub fn issuer() -> EmailActionIssuer<InMemoryJtiRegistry> {
        EmailActionIssuer::new(codec(), InMemoryJtiRegistry::new())
    }
}
