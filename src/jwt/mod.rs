//! Signed token codec and the email action token issuer.
//!
//! ```ignore
//! use tessera::jwt::{JwtCodec, JwtConfig, TokenKind};
//!
//! let config = JwtConfig::new(secret)?.with_algorithm_name("HS256")?;
//! let codec = JwtCodec::new(config);
//!
//! let (token, claims) = codec.mint(account_id, TokenKind::Access, Duration::minutes(15))?;
//! let verified = codec.decode(&token)?;
//! ```

mod claims;
mod codec;
mod config;
mod email_action;

pub use claims::{Claims, TokenKind};
pub use codec::{JwtCodec, TokenPair};
pub use config::{JwtConfig, MIN_SECRET_LENGTH};
pub use email_action::EmailActionIssuer;
