use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Logs every event through the `log` facade.
///
/// Security relevant events (failed logins, token reuse) are raised to at
/// least `Warn`.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Logs at INFO.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &AuthEvent) -> log::Level {
        if event.is_security_relevant() {
            self.level.min(log::Level::Warn)
        } else {
            self.level
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AuthEvent) {
        log::log!(
            target: "tessera_auth::events",
            self.level_for(event),
            "event={} {:?}",
            event.name(),
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_level() {
        assert_eq!(LoggingListener::default().level, log::Level::Info);
    }

    #[test]
    fn test_security_events_raised_to_warn() {
        let listener = LoggingListener::with_level(log::Level::Debug);
        let at = Utc::now();

        let reuse = AuthEvent::TokenReuseDetected {
            account_id: 42,
            jti: "x".to_owned(),
            at,
        };
        assert_eq!(listener.level_for(&reuse), log::Level::Warn);

        let refreshed = AuthEvent::TokenRefreshed {
            account_id: 42,
            jti: "y".to_owned(),
            at,
        };
        assert_eq!(listener.level_for(&refreshed), log::Level::Debug);

        let error_listener = LoggingListener::with_level(log::Level::Error);
        assert_eq!(error_listener.level_for(&reuse), log::Level::Error);
    }

    #[tokio::test]
    async fn test_handle() {
        let listener = LoggingListener::new();
        listener
            .handle(&AuthEvent::LoggedOut {
                account_id: 1,
                at: Utc::now(),
            })
            .await;
    }
}
