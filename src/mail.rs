//! Outbound email collaborator.
//!
//! The core only hands over the recipient, the raw token and its kind;
//! building links and templates is the host application's business.

use async_trait::async_trait;

use crate::jwt::TokenKind;
use crate::{AuthError, SecretString};

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Fails with `EmailDelivery` when the message could not be handed off.
    async fn send(&self, to: &str, token: &SecretString, kind: TokenKind)
        -> Result<(), AuthError>;
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::{MockMailer, SentEmail};

#[cfg(any(test, feature = "mocks"))]
mod mock {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::Mailer;
    use crate::jwt::TokenKind;
    use crate::{AuthError, SecretString};

    #[derive(Debug, Clone)]
    pub struct SentEmail {
        pub to: String,
        pub token: SecretString,
        pub kind: TokenKind,
    }

    /// Records every message instead of sending it.
    #[derive(Clone, Default)]
    pub struct MockMailer {
        pub sent: Arc<Mutex<Vec<SentEmail>>>,
        failing: Arc<AtomicBool>,
    }

    impl MockMailer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every subsequent `send` fails with `EmailDelivery`.
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.failing.store(true, Ordering::SeqCst);
            mailer
        }

        pub fn last(&self) -> Option<SentEmail> {
            self.sent.lock().unwrap().last().cloned()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(
            &self,
            to: &str,
            token: &SecretString,
            kind: TokenKind,
        ) -> Result<(), AuthError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::EmailDelivery("mock transport down".to_owned()));
            }

            self.sent.lock().unwrap().push(SentEmail {
                to: to.to_owned(),
                token: token.clone(),
                kind,
            });
            Ok(())
        }
    }
}
