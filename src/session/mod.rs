//! Session lifecycle on top of a protocol client.
//!
//! - [`UaClient`] is the protocol boundary; [`SimClient`] is an in-process implementation.
//! - [`SessionManager`] runs the bootstrap, watches keep-alives and owns the single reconnect handler.
//! - [`BootstrapPhase`] and [`ExitCode`] classify how far establishment got.

mod client;
mod manager;
mod phase;
mod reconnect;
mod signal;
mod sim;
mod state;
mod status;
mod trust;

pub use client::{
    EndpointDescription, MonitoredTag, ReconnectOutcome, SessionHandle, SubscriptionHandle,
    UaClient,
};
pub use manager::{SessionManager, SessionSettings};
pub use phase::{BootstrapPhase, ExitCode, PhaseCursor};
pub use signal::{KeepAlive, SessionSignal, SignalSink, TagNotification};
pub use sim::{SimClient, SimTag};
pub use state::SessionState;
pub use status::StatusCode;
pub use trust::TrustPolicy;
