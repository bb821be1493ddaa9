//! # linevisor
//!
//! **Linevisor** turns equipment-state telemetry from a publish/subscribe
//! industrial protocol session into per-line downtime intervals.
//!
//! It keeps one subscription session alive across network faults (one
//! reconnect handler at a time, fixed retry period, failures classified by
//! bootstrap phase) and folds the unordered, concurrent stream of tag changes
//! into a downtime ledger with at most one open interval per line.
//!
//! ## Architecture
//! ```text
//!     ┌───────────────────────────┐
//!     │  UaClient (protocol stack)│ ◄── TrustPolicy (certificate decisions)
//!     └────────────┬──────────────┘
//!                  │ SignalSink: KeepAlive / KeepAliveStopped / TagNotification
//!                  ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                    │
//! │  - pump: keep-alives ─► SessionManager                           │
//! │          notifications ─► NotificationDispatcher (task per item) │
//! │  - refresh ticker ─► DowntimeRegistry::refresh_elapsed           │
//! │  - shutdown: close_all_at ─► snapshot ─► SessionManager::shutdown│
//! └──────┬──────────────────────┬──────────────────────┬─────────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐   ┌────────────────────────┐   ┌──────────────────┐
//! │SessionManager│   │ NotificationDispatcher │──►│ DowntimeRegistry │
//! │ bootstrap    │   │ tag ─► line, value ─►  │   │ line ─► entries  │
//! │ reconnect    │   │ down/running, per-line │   │ ≤1 open per line │
//! └──────┬───────┘   │ serialization          │   └────────┬─────────┘
//!        │           └───────────┬────────────┘            │
//!        └────── publish(Event) ─┴─────────────────────────┘
//!                                ▼
//!                      Bus (broadcast) ─► listener ─► SubscriberSet ─► LogWriter, ...
//! ```
//!
//! ## Exit status
//! | Outcome                                  | [`ExitCode`]              | code  |
//! |------------------------------------------|---------------------------|-------|
//! | clean stop                               | `Ok`                      | 0x00  |
//! | bootstrap failed at phase P              | P (`CreateSession`, ...)  | 0x11-0x17 |
//! | stop while running without clean cancel  | `Running`                 | 0x18  |
//! | transport declared the connection dead   | `NoKeepAlive`             | 0x30  |
//! | configuration rejected                   | `InvalidConfig`           | 0x40  |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use linevisor::{Config, OrchestratorBuilder, SimClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::load(Some("linevisor.toml".as_ref()))?;
//!     cfg.validate()?;
//!
//!     let client = Arc::new(SimClient::from_config(&cfg));
//!     let summary = OrchestratorBuilder::new(cfg, client).build().run().await;
//!
//!     print!("{}", summary.report());
//!     std::process::exit(summary.exit.code());
//! }
//! ```

mod config;
mod core;
mod dispatch;
mod downtime;
mod error;
mod events;
mod session;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, TagConfig};
pub use core::{Orchestrator, OrchestratorBuilder, RunSummary, StopCause};
pub use dispatch::{Dispatch, LineState, NotificationDispatcher, TagBinding, TagMapping, TagValue};
pub use downtime::{
    DowntimeEntry, DowntimeRegistry, ManualClock, OpenOutcome, Report, ReportFormat,
    SystemTimeSource, TimeSource,
};
pub use error::{ClientError, ConfigError, SessionError, ValidationError};
pub use events::{Bus, Event, EventKind};
pub use session::{
    BootstrapPhase, EndpointDescription, ExitCode, KeepAlive, MonitoredTag, PhaseCursor,
    ReconnectOutcome, SessionHandle, SessionManager, SessionSettings, SessionSignal, SessionState,
    SignalSink, SimClient, SimTag, StatusCode, SubscriptionHandle, TagNotification, TrustPolicy,
    UaClient,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
