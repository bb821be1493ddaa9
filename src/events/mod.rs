//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the session manager, reconnect
//! handler, notification dispatcher, downtime registry and orchestrator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `SessionManager`, `ReconnectHandler`, `TrustPolicy`,
//!   `NotificationDispatcher`, `DowntimeRegistry`, `Orchestrator`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the orchestrator listener (fans out to `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
