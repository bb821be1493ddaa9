//! # ReconnectHandler: fixed-period session recovery.
//!
//! Started by [`SessionManager::on_keep_alive`](crate::SessionManager::on_keep_alive)
//! when a keep-alive reports a bad status. At most one handler is in flight.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► sleep(period)          (cancellable)
//!   ├─► attempt += 1
//!   ├─► manager.try_reconnect  (cancellable)
//!   │     ├─► Ok  → manager.complete_reconnect(id, ..) → break
//!   │     └─► Err → publish ReconnectAttemptFailed → continue
//!   └─► manager dropped → break
//! }
//! ```
//!
//! ## Rules
//! - Attempts are spaced by a **fixed** period (no backoff, no jitter).
//! - The handler holds a `Weak` reference; it never keeps the manager alive.
//! - A completion is applied only if the manager still considers this handler current.

use std::sync::Weak;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

use super::client::SessionHandle;
use super::manager::SessionManager;

pub(crate) struct ReconnectHandler {
    id: u64,
    manager: Weak<SessionManager>,
    session: SessionHandle,
    period: Duration,
    bus: Bus,
}

impl ReconnectHandler {
    pub(crate) fn new(
        id: u64,
        manager: Weak<SessionManager>,
        session: SessionHandle,
        period: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            id,
            manager,
            session,
            period,
            bus,
        }
    }

    /// Retries until the session is recovered or `cancel` fires.
    pub(crate) async fn run(self, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            select! {
                _ = time::sleep(self.period) => {}
                _ = cancel.cancelled() => break,
            }

            let Some(manager) = self.manager.upgrade() else {
                break;
            };
            attempt = attempt.saturating_add(1);

            let res = select! {
                res = manager.try_reconnect(&self.session) => res,
                _ = cancel.cancelled() => break,
            };

            match res {
                Ok((session, subscription)) => {
                    manager.complete_reconnect(self.id, session, subscription, attempt);
                    break;
                }
                Err(e) => {
                    self.bus.publish(
                        Event::new(EventKind::ReconnectAttemptFailed)
                            .with_attempt(attempt)
                            .with_delay(self.period)
                            .with_reason(e.to_string()),
                    );
                }
            }
        }
    }
}
