//! # SessionManager: one live subscription session, kept alive.
//!
//! Owns the session lifecycle on top of a [`UaClient`]:
//! - runs the ordered bootstrap (see [`BootstrapPhase`]) and stops at the first failure;
//! - reacts to keep-alive reports, starting **at most one** [`ReconnectHandler`];
//! - swaps in the recovered session and, when needed, recreates the subscription;
//! - turns a permanent keep-alive stop into the terminal `Failed` state;
//! - releases everything on [`SessionManager::shutdown`].
//!
//! ## Bootstrap
//! ```text
//! connect()
//!   ├─► CreateApplication   (TrustPolicy handed to the client)
//!   ├─► DiscoverEndpoints
//!   ├─► CreateSession       (SignalSink handed to the client)
//!   ├─► BrowseNamespace
//!   ├─► CreateSubscription
//!   ├─► AddMonitoredItems
//!   ├─► AddSubscription
//!   └─► Running, state = Connected
//!
//! each phase: publish PhaseStarting ─► client call ─► PhaseCompleted
//!                                                  └► PhaseFailed, state = Failed, return Err
//!
//! state left Connecting meanwhile (keep-alive stopped, shutdown) ─► Interrupted
//! ```
//!
//! ## Reconnect guard
//! The check "no handler in flight" and the store of the new handler happen
//! under one lock acquisition, so concurrent bad keep-alives start one handler.
//! Completions are matched against the current handler id; a completion from a
//! discarded handler is ignored.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{ClientError, SessionError};
use crate::events::{Bus, Event, EventKind};

use super::client::{MonitoredTag, SessionHandle, SubscriptionHandle, UaClient};
use super::phase::{BootstrapPhase, PhaseCursor};
use super::reconnect::ReconnectHandler;
use super::signal::{KeepAlive, SessionSignal, SignalSink};
use super::state::SessionState;
use super::trust::TrustPolicy;

/// Connection settings used by a [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Endpoint url of the telemetry source.
    pub endpoint: String,
    /// Accept server certificates that fail with `BadCertificateUntrusted`.
    pub accept_untrusted: bool,
    /// Fixed delay between reconnect attempts.
    pub reconnect_period: Duration,
    /// Subscription publishing interval.
    pub publishing_interval: Duration,
    /// Items to monitor, in subscription order.
    pub tags: Vec<MonitoredTag>,
}

impl SessionSettings {
    /// Extracts session settings from the runtime configuration.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            accept_untrusted: cfg.accept_untrusted,
            reconnect_period: cfg.reconnect_period(),
            publishing_interval: cfg.publishing_interval(),
            tags: cfg
                .tags
                .iter()
                .map(|t| MonitoredTag {
                    display_name: Arc::from(t.display_name.as_str()),
                    address: t.address.clone(),
                })
                .collect(),
        }
    }
}

/// The in-flight reconnect handler.
struct ReconnectSlot {
    id: u64,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// State guarded by the manager lock.
struct Inner {
    state: SessionState,
    phases: PhaseCursor,
    session: Option<SessionHandle>,
    subscription: Option<SubscriptionHandle>,
    reconnect: Option<ReconnectSlot>,
}

/// Owns and preserves one subscription session.
pub struct SessionManager {
    client: Arc<dyn UaClient>,
    settings: SessionSettings,
    bus: Bus,
    inner: Mutex<Inner>,
    sink: SignalSink,
    signals: Mutex<Option<mpsc::UnboundedReceiver<SessionSignal>>>,
    handlers_created: AtomicU64,
    keep_alive_stopped: AtomicBool,
    stopped_token: CancellationToken,
    runtime_token: CancellationToken,
    closed: AtomicBool,
    weak_self: Weak<SessionManager>,
}

impl SessionManager {
    /// Creates a disconnected manager.
    pub fn new(client: Arc<dyn UaClient>, settings: SessionSettings, bus: Bus) -> Arc<Self> {
        let (sink, rx) = SignalSink::channel();
        Arc::new_cyclic(|weak| Self {
            client,
            settings,
            bus,
            inner: Mutex::new(Inner {
                state: SessionState::Disconnected,
                phases: PhaseCursor::new(),
                session: None,
                subscription: None,
                reconnect: None,
            }),
            sink,
            signals: Mutex::new(Some(rx)),
            handlers_created: AtomicU64::new(0),
            keep_alive_stopped: AtomicBool::new(false),
            stopped_token: CancellationToken::new(),
            runtime_token: CancellationToken::new(),
            closed: AtomicBool::new(false),
            weak_self: weak.clone(),
        })
    }

    /// Takes the receiving end of the client signal channel (once).
    pub fn take_signals(&self) -> Option<mpsc::UnboundedReceiver<SessionSignal>> {
        self.signals.lock().take()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// The last bootstrap phase entered, `None` before `connect`.
    pub fn phase(&self) -> Option<BootstrapPhase> {
        self.inner.lock().phases.current()
    }

    /// The current session, if one is held.
    pub fn session(&self) -> Option<SessionHandle> {
        self.inner.lock().session.clone()
    }

    pub fn reconnect_in_flight(&self) -> bool {
        self.inner.lock().reconnect.is_some()
    }

    /// Number of reconnect handlers created over the manager's lifetime.
    pub fn reconnect_handlers_created(&self) -> u64 {
        self.handlers_created.load(Ordering::SeqCst)
    }

    /// True once the transport declared the connection permanently dead.
    pub fn is_keep_alive_stopped(&self) -> bool {
        self.keep_alive_stopped.load(Ordering::SeqCst)
    }

    /// Completes when the keep-alive stops permanently.
    pub async fn keep_alive_stopped(&self) {
        self.stopped_token.cancelled().await
    }

    /// Runs the bootstrap sequence.
    ///
    /// Returns [`SessionError::Bootstrap`] tagged with the failing phase; no
    /// later phase is attempted. Only valid from `Disconnected`.
    ///
    /// A keep-alive stop or shutdown that lands mid-bootstrap ends it with
    /// [`SessionError::Interrupted`]; the session is never promoted out of
    /// `Failed`.
    pub async fn connect(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Disconnected || self.closed.load(Ordering::SeqCst) {
                return Err(SessionError::InvalidState {
                    op: "connect",
                    state: inner.state,
                });
            }
            inner.state = SessionState::Connecting;
        }

        let client = Arc::clone(&self.client);
        let trust = TrustPolicy::new(self.settings.accept_untrusted, self.bus.clone());

        self.run_phase(
            BootstrapPhase::CreateApplication,
            client.create_application(trust),
        )
        .await?;

        let endpoint = self
            .run_phase(
                BootstrapPhase::DiscoverEndpoints,
                client.discover_endpoints(&self.settings.endpoint),
            )
            .await?;

        let session = self
            .run_phase(
                BootstrapPhase::CreateSession,
                client.create_session(&endpoint, self.sink.clone()),
            )
            .await?;
        self.inner.lock().session = Some(session.clone());

        self.run_phase(
            BootstrapPhase::BrowseNamespace,
            client.browse_namespace(&session),
        )
        .await?;

        let subscription = self
            .run_phase(
                BootstrapPhase::CreateSubscription,
                client.create_subscription(&session, self.settings.publishing_interval),
            )
            .await?;

        self.run_phase(
            BootstrapPhase::AddMonitoredItems,
            client.add_monitored_items(&session, &subscription, &self.settings.tags),
        )
        .await?;

        self.run_phase(
            BootstrapPhase::AddSubscription,
            client.add_subscription(&session, &subscription),
        )
        .await?;

        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Connecting {
                return Err(SessionError::Interrupted {
                    phase: BootstrapPhase::AddSubscription,
                    state: inner.state,
                });
            }
            inner.phases.enter(BootstrapPhase::Running);
            inner.subscription = Some(subscription);
            inner.state = SessionState::Connected;
        }
        self.bus.publish(
            Event::new(EventKind::SessionConnected)
                .with_phase(BootstrapPhase::Running)
                .with_reason(endpoint.url),
        );
        Ok(())
    }

    /// Runs one bootstrap phase: enter it, publish, await the client call.
    async fn run_phase<T, F>(&self, phase: BootstrapPhase, call: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Connecting {
                return Err(SessionError::Interrupted {
                    phase: inner.phases.current().unwrap_or(phase),
                    state: inner.state,
                });
            }
            if !inner.phases.enter(phase) {
                inner.state = SessionState::Failed;
                return Err(SessionError::PhaseOrder { phase });
            }
        }
        self.bus
            .publish(Event::new(EventKind::PhaseStarting).with_phase(phase));

        match call.await {
            Ok(value) => {
                self.bus
                    .publish(Event::new(EventKind::PhaseCompleted).with_phase(phase));
                Ok(value)
            }
            Err(source) => {
                {
                    let mut inner = self.inner.lock();
                    if inner.state == SessionState::Connecting {
                        inner.state = SessionState::Failed;
                    }
                }
                self.bus.publish(
                    Event::new(EventKind::PhaseFailed)
                        .with_phase(phase)
                        .with_reason(source.to_string()),
                );
                Err(SessionError::Bootstrap { phase, source })
            }
        }
    }

    /// Handles one keep-alive report.
    ///
    /// Good status is a no-op. Bad status on a connected session starts a
    /// reconnect handler unless one is already in flight.
    pub fn on_keep_alive(&self, keep_alive: KeepAlive) {
        if keep_alive.status.is_good() {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::KeepAliveBad)
                .with_status(keep_alive.status)
                .with_requests(keep_alive.outstanding_requests, keep_alive.defunct_requests),
        );

        let mut inner = self.inner.lock();
        if inner.reconnect.is_some() || inner.state != SessionState::Connected {
            return;
        }
        let Some(session) = inner.session.clone() else {
            return;
        };

        let id = self.handlers_created.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.runtime_token.child_token();
        let handler = ReconnectHandler::new(
            id,
            self.weak_self.clone(),
            session,
            self.settings.reconnect_period,
            self.bus.clone(),
        );

        inner.state = SessionState::Reconnecting;
        self.bus.publish(
            Event::new(EventKind::ReconnectStarted).with_delay(self.settings.reconnect_period),
        );
        let join = tokio::spawn(handler.run(cancel.clone()));
        inner.reconnect = Some(ReconnectSlot { id, cancel, join });
    }

    /// Reconnects `old` through the client and recreates the subscription if
    /// the server did not transfer it.
    pub(crate) async fn try_reconnect(
        &self,
        old: &SessionHandle,
    ) -> Result<(SessionHandle, Option<SubscriptionHandle>), ClientError> {
        let outcome = self.client.reconnect(old).await?;
        if outcome.subscription_transferred {
            return Ok((outcome.session, None));
        }

        let session = outcome.session;
        let subscription = self
            .client
            .create_subscription(&session, self.settings.publishing_interval)
            .await?;
        self.client
            .add_monitored_items(&session, &subscription, &self.settings.tags)
            .await?;
        self.client.add_subscription(&session, &subscription).await?;
        self.bus.publish(Event::new(EventKind::SubscriptionRestored));
        Ok((session, Some(subscription)))
    }

    /// Installs the result of reconnect handler `id`.
    ///
    /// Returns `false` (and changes nothing) if `id` is not the current handler.
    pub(crate) fn complete_reconnect(
        &self,
        id: u64,
        session: SessionHandle,
        subscription: Option<SubscriptionHandle>,
        attempt: u32,
    ) -> bool {
        let mut inner = self.inner.lock();
        match &inner.reconnect {
            Some(slot) if slot.id == id => {}
            _ => return false,
        }
        // The handler is finishing on its own task; dropping the slot detaches it.
        inner.reconnect = None;
        inner.session = Some(session);
        if let Some(subscription) = subscription {
            inner.subscription = Some(subscription);
        }
        if inner.state == SessionState::Reconnecting {
            inner.state = SessionState::Connected;
        }
        self.bus
            .publish(Event::new(EventKind::ReconnectCompleted).with_attempt(attempt));
        true
    }

    /// Handles the transport's permanent-death signal. Terminal.
    pub fn on_keep_alive_stopped(&self) {
        if self.keep_alive_stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let slot = {
            let mut inner = self.inner.lock();
            inner.state = SessionState::Failed;
            inner.reconnect.take()
        };
        if let Some(slot) = slot {
            slot.cancel.cancel();
        }
        self.bus.publish(Event::new(EventKind::KeepAliveStopped));
        self.stopped_token.cancel();
    }

    /// Releases the session and any in-flight reconnect handler. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.runtime_token.cancel();

        let (slot, session) = {
            let mut inner = self.inner.lock();
            let slot = inner.reconnect.take();
            let session = inner.session.take();
            inner.subscription = None;
            if inner.state != SessionState::Failed {
                inner.state = SessionState::Disconnected;
            }
            (slot, session)
        };

        if let Some(slot) = slot {
            slot.cancel.cancel();
            let _ = slot.join.await;
        }

        let mut closed = Event::new(EventKind::SessionClosed);
        if let Some(session) = session {
            if let Err(e) = self.client.close_session(&session).await {
                closed = closed.with_reason(e.to_string());
            }
        }
        self.bus.publish(closed);
    }
}
