//! # Orchestrator: session, dispatch and shutdown wiring.
//!
//! ## Architecture
//! ```text
//!  UaClient ──► SignalSink ──► pump ──┬─► SessionManager::on_keep_alive / on_keep_alive_stopped
//!                                     └─► JoinSet ─► NotificationDispatcher::dispatch ─► DowntimeRegistry
//!
//!  refresh ticker ──► DowntimeRegistry::refresh_elapsed (every refresh_interval)
//!
//!  everyone ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Shutdown path
//! ```text
//! stop cause (signal | deadline | keep-alive stopped | requested)
//!   └─► take the shutdown instant, publish ShutdownRequested
//!   └─► stop intake, wait in-flight dispatches up to grace (GraceExceeded otherwise)
//!   └─► stop refresh ticker
//!   └─► DowntimeRegistry::close_all_at(shutdown instant)
//!   └─► DowntimeRegistry::snapshot
//!   └─► SessionManager::shutdown
//!   └─► publish RunFinished, drain listener, shut subscribers down
//! ```
//!
//! The exit status is the failing bootstrap phase, `NoKeepAlive` if the
//! transport declared the connection dead, otherwise `Ok`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatch::NotificationDispatcher;
use crate::downtime::{DowntimeEntry, DowntimeRegistry, Report};
use crate::events::{Bus, Event, EventKind};
use crate::session::{ExitCode, SessionManager, SessionSignal};
use crate::subscribers::SubscriberSet;

use super::shutdown;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Operator interrupt.
    Signal,
    /// The configured run-time bound elapsed.
    Deadline,
    /// The caller's stop future completed.
    Requested,
    /// The transport declared the connection permanently dead.
    KeepAliveStopped,
    /// Signal handlers could not be installed.
    SignalError,
}

impl StopCause {
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Deadline => "deadline",
            Self::Requested => "requested",
            Self::KeepAliveStopped => "keep_alive_stopped",
            Self::SignalError => "signal_error",
        }
    }
}

/// Outcome of [`Orchestrator::run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub exit: ExitCode,
    /// `None` if the bootstrap failed and the run never started.
    pub cause: Option<StopCause>,
    /// Final snapshot, taken after every open entry was closed.
    pub downtime: Vec<DowntimeEntry>,
}

impl RunSummary {
    pub fn report(&self) -> Report {
        Report::new(self.downtime.clone())
    }
}

/// Owns the runtime pieces for one process run.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    subs: SubscriberSet,
    registry: Arc<DowntimeRegistry>,
    dispatcher: Arc<NotificationDispatcher>,
    session: Arc<SessionManager>,
}

impl Orchestrator {
    pub(crate) fn new(
        cfg: Config,
        bus: Bus,
        subs: SubscriberSet,
        registry: Arc<DowntimeRegistry>,
        dispatcher: Arc<NotificationDispatcher>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            registry,
            dispatcher,
            session,
        }
    }

    pub fn registry(&self) -> Arc<DowntimeRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs until an OS termination signal, the configured run-time bound,
    /// or a permanent keep-alive stop.
    pub async fn run(self) -> RunSummary {
        let run_time = self.cfg.run_time();
        self.run_until(async move {
            let signal = async {
                match shutdown::wait_for_shutdown_signal().await {
                    Ok(()) => StopCause::Signal,
                    Err(e) => {
                        tracing::error!(error = %e, "cannot install shutdown signal handlers");
                        StopCause::SignalError
                    }
                }
            };
            match run_time {
                Some(limit) => select! {
                    cause = signal => cause,
                    _ = time::sleep(limit) => StopCause::Deadline,
                },
                None => signal.await,
            }
        })
        .await
    }

    /// Runs until `stop` completes or the keep-alive stops permanently.
    pub async fn run_until<F>(self, stop: F) -> RunSummary
    where
        F: Future<Output = StopCause> + Send,
    {
        let Self {
            cfg,
            bus,
            subs,
            registry,
            dispatcher,
            session,
        } = self;

        let listener_stop = CancellationToken::new();
        let listener = spawn_listener(&bus, subs, listener_stop.clone());

        let intake = CancellationToken::new();
        let pump = session.take_signals().map(|signals| {
            tokio::spawn(route_signals(
                Arc::clone(&session),
                Arc::clone(&dispatcher),
                signals,
                intake.clone(),
                cfg.grace(),
                bus.clone(),
            ))
        });

        if let Err(e) = session.connect().await {
            let exit = e.exit_code();
            intake.cancel();
            join_quietly(pump).await;
            session.shutdown().await;
            bus.publish(Event::new(EventKind::RunFinished).with_reason(exit.as_label()));
            listener_stop.cancel();
            let _ = listener.await;
            return RunSummary {
                exit,
                cause: None,
                downtime: registry.snapshot().await,
            };
        }

        let ticker_stop = CancellationToken::new();
        let ticker = spawn_refresh(
            Arc::clone(&registry),
            cfg.refresh_interval(),
            ticker_stop.clone(),
        );

        let cause = select! {
            cause = stop => cause,
            _ = session.keep_alive_stopped() => StopCause::KeepAliveStopped,
        };
        let stopped_at = registry.now();
        bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(cause.as_label()));

        intake.cancel();
        join_quietly(pump).await;

        ticker_stop.cancel();
        let _ = ticker.await;

        registry.close_all_at(stopped_at).await;
        let downtime = registry.snapshot().await;

        session.shutdown().await;

        let exit = if session.is_keep_alive_stopped() {
            ExitCode::NoKeepAlive
        } else if cause == StopCause::SignalError {
            ExitCode::Running
        } else {
            ExitCode::Ok
        };
        bus.publish(Event::new(EventKind::RunFinished).with_reason(exit.as_label()));

        listener_stop.cancel();
        let _ = listener.await;

        RunSummary {
            exit,
            cause: Some(cause),
            downtime,
        }
    }
}

async fn join_quietly(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        let _ = handle.await;
    }
}

/// Forwards bus events to subscribers until `stop`, then drains what is queued.
fn spawn_listener(bus: &Bus, subs: SubscriberSet, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => subs.emit(&ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        subs.shutdown().await;
    })
}

/// Routes client signals; each notification is dispatched on its own task.
async fn route_signals(
    session: Arc<SessionManager>,
    dispatcher: Arc<NotificationDispatcher>,
    mut signals: mpsc::UnboundedReceiver<SessionSignal>,
    intake: CancellationToken,
    grace: Duration,
    bus: Bus,
) {
    let mut inflight = JoinSet::new();

    loop {
        select! {
            _ = intake.cancelled() => break,
            sig = signals.recv() => match sig {
                Some(SessionSignal::KeepAlive(ka)) => session.on_keep_alive(ka),
                Some(SessionSignal::KeepAliveStopped) => session.on_keep_alive_stopped(),
                Some(SessionSignal::Notification(n)) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    inflight.spawn(async move {
                        dispatcher.dispatch(n).await;
                    });
                }
                None => break,
            },
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
        }
    }
    signals.close();

    let drained = time::timeout(grace, async {
        while inflight.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        let abandoned = inflight.len();
        bus.publish(
            Event::new(EventKind::GraceExceeded)
                .with_count(abandoned)
                .with_delay(grace),
        );
        inflight.abort_all();
    }
}

/// Refreshes elapsed time of open entries at a fixed period.
fn spawn_refresh(
    registry: Arc<DowntimeRegistry>,
    every: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            select! {
                _ = ticker.tick() => {
                    registry.refresh_elapsed().await;
                }
                _ = stop.cancelled() => break,
            }
        }
    })
}
