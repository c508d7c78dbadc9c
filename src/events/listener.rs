use async_trait::async_trait;

use super::AuthEvent;

/// Receives every dispatched [`AuthEvent`].
///
/// ```rust,ignore
/// use tessera::events::{AuthEvent, Listener};
/// use async_trait::async_trait;
///
/// struct ReuseAlert;
///
/// #[async_trait]
/// impl Listener for ReuseAlert {
///     async fn handle(&self, event: &AuthEvent) {
///         if let AuthEvent::TokenReuseDetected { account_id, .. } = event {
///             // page the on-call, lock the account, ...
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &AuthEvent);
}
