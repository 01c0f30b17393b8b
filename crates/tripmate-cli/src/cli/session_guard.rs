//! Turns a rejected session refresh into a single "log in again" exit.

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use tripmate_core::event::EventBus;
use tripmate_types::event::{LoginReason, SessionEvent};

pub const SESSION_EXPIRED: &str = "Session expired. Run `tripmate login`.";

/// Watches the bus for the duration of one command.
///
/// Must be created before the command runs so no `LoginRequired` is missed.
pub struct SessionGuard {
    events: broadcast::Receiver<SessionEvent>,
}

impl SessionGuard {
    pub fn watch(bus: &EventBus) -> Self {
        Self {
            events: bus.subscribe(),
        }
    }

    /// Replace a failed command's error with the login hint when the
    /// session expired while it ran.
    ///
    /// A command that already handled the expiry itself (and returned `Ok`)
    /// is left alone.
    pub fn settle(mut self, result: anyhow::Result<()>) -> anyhow::Result<()> {
        let expired = self.session_expired();
        match result {
            Err(e) if expired => {
                debug!(error = ?e, "command failed after the session expired");
                Err(anyhow::anyhow!(SESSION_EXPIRED))
            }
            other => other,
        }
    }

    fn session_expired(&mut self) -> bool {
        let mut expired = false;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::LoginRequired {
                    reason: LoginReason::RefreshRejected,
                }) => expired = true,
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return expired,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripmate_types::error::HttpError;

    use crate::cli::style::http_failure;

    fn rejected_401() -> anyhow::Result<()> {
        Err(http_failure(HttpError::Status {
            status: 401,
            message: None,
        }))
    }

    #[test]
    fn rejected_refresh_becomes_one_login_hint() {
        let bus = EventBus::default();
        let guard = SessionGuard::watch(&bus);

        // Concurrent requests can each see the refresh fail.
        bus.publish(SessionEvent::AuthChanged {
            authenticated: false,
        });
        bus.publish(SessionEvent::LoginRequired {
            reason: LoginReason::RefreshRejected,
        });
        bus.publish(SessionEvent::LoginRequired {
            reason: LoginReason::RefreshRejected,
        });

        let err = guard.settle(rejected_401()).unwrap_err();
        let rendered = format!("{err:#}");
        assert_eq!(rendered, SESSION_EXPIRED);
        assert_eq!(rendered.matches("tripmate login").count(), 1);
        assert!(!rendered.contains("HTTP 401"));
    }

    #[test]
    fn other_failures_pass_through() {
        let bus = EventBus::default();
        let guard = SessionGuard::watch(&bus);

        let err = guard.settle(rejected_401()).unwrap_err();
        assert_eq!(err.to_string(), "The server rejected the request (HTTP 401).");
    }

    #[test]
    fn missing_session_at_startup_is_not_an_expiry() {
        let bus = EventBus::default();
        let guard = SessionGuard::watch(&bus);
        bus.publish(SessionEvent::LoginRequired {
            reason: LoginReason::NoSession,
        });

        let err = guard
            .settle(Err(anyhow::anyhow!("Not logged in. Run `tripmate login` first.")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Not logged in. Run `tripmate login` first.");
    }

    #[test]
    fn successful_command_is_untouched() {
        let bus = EventBus::default();
        let guard = SessionGuard::watch(&bus);
        bus.publish(SessionEvent::LoginRequired {
            reason: LoginReason::RefreshRejected,
        });

        assert!(guard.settle(Ok(())).is_ok());
    }
}
