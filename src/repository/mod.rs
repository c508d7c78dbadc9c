//! Storage abstractions used by the actions.
//!
//! # Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`RefreshTokenRepository`] | Persisted refresh token records and rotation |
//! | [`JtiRegistry`] | Insert-if-absent set of token ids with expiry |
//! | [`AccountRepository`] | Account lookup and credential updates (host supplied) |
//!
//! # Mock Implementations
//!
//! Enable the `mocks` feature for in-memory implementations useful for testing:
//!
//! - [`MockRefreshTokenRepository`]
//! - [`MockAccountRepository`]
//!
//! [`InMemoryJtiRegistry`] is always available; it is a valid production
//! registry for a single process.

mod account;
mod jti_registry;
mod refresh_token;

#[cfg(any(test, feature = "mocks"))]
mod account_mock;
#[cfg(any(test, feature = "mocks"))]
mod refresh_token_mock;

pub use account::{Account, AccountRepository};
pub use jti_registry::{spawn_janitor, InMemoryJtiRegistry, JtiRegistry};
pub use refresh_token::{
    IssuedRefreshToken, RefreshTokenRecord, RefreshTokenRepository, SessionMetadata, TokenState,
};

#[cfg(any(test, feature = "mocks"))]
pub use account_mock::MockAccountRepository;
#[cfg(any(test, feature = "mocks"))]
pub use refresh_token_mock::MockRefreshTokenRepository;
