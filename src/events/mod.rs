//! Audit events fired by the actions.
//!
//! Nothing is delivered until listeners are registered:
//!
//! ```rust,ignore
//! use tessera::register_event_listeners;
//! use tessera::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Token reuse is reported as [`AuthEvent::TokenReuseDetected`] followed by
//! [`AuthEvent::AllTokensRevoked`] for the same account.

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::AuthEvent;
pub use listener::Listener;
pub use registry::{dispatch, register_event_listeners, EventRegistry};
