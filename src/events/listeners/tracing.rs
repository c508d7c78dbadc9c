use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Emits events through `tracing`. Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &AuthEvent) {
        if event.is_security_relevant() {
            tracing::warn!(
                target: "tessera_auth::events",
                event_name = event.name(),
                ?event,
                "auth event"
            );
        } else {
            tracing::info!(
                target: "tessera_auth::events",
                event_name = event.name(),
                ?event,
                "auth event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_handle() {
        TracingListener
            .handle(&AuthEvent::EmailVerified {
                account_id: 1,
                at: Utc::now(),
            })
            .await;
    }
}
