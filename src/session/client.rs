//! # Protocol client boundary.
//!
//! [`UaClient`] is the seam between the session state machine and a protocol
//! stack (message encoding, secure channel, certificate handling, browsing).
//! It exposes one async method per bootstrap phase plus `reconnect` and
//! `close_session`; everything above it in this crate is protocol-agnostic.
//!
//! A client pushes connection health and data changes through the
//! [`SignalSink`] it receives in [`UaClient::create_session`], and asks the
//! [`TrustPolicy`] it receives in [`UaClient::create_application`] whenever it
//! must decide on a server certificate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClientError;

use super::{SignalSink, TrustPolicy};

/// Endpoint selected during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescription {
    /// Endpoint url, e.g. `opc.tcp://host:4840`.
    pub url: String,
    /// Security policy uri chosen for the session.
    pub security_policy: String,
}

/// Opaque handle of a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: u64,
    pub endpoint: Arc<str>,
}

/// Opaque handle of a subscription within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: u32,
}

/// One data point to monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTag {
    /// Name reported back in notifications.
    pub display_name: Arc<str>,
    /// Server-side node address, e.g. `ns=2;s=Line1.State`.
    pub address: String,
}

/// Result of a successful reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectOutcome {
    /// The session to use from now on (may equal the old one).
    pub session: SessionHandle,
    /// False when the server dropped the subscription and it must be recreated.
    pub subscription_transferred: bool,
}

/// Async protocol client.
///
/// Every method maps to one protocol service call; implementations own their
/// timeouts. Methods are called sequentially by one [`SessionManager`](crate::SessionManager),
/// except `reconnect`, which runs on the reconnect handler's task.
#[async_trait]
pub trait UaClient: Send + Sync + 'static {
    /// Loads the application configuration and certificate store.
    async fn create_application(&self, trust: TrustPolicy) -> Result<(), ClientError>;

    /// Resolves `endpoint` and selects the endpoint description to connect to.
    async fn discover_endpoints(&self, endpoint: &str) -> Result<EndpointDescription, ClientError>;

    /// Opens a session; health and notifications are pushed into `sink`.
    async fn create_session(
        &self,
        endpoint: &EndpointDescription,
        sink: SignalSink,
    ) -> Result<SessionHandle, ClientError>;

    /// Browses the server namespace.
    async fn browse_namespace(&self, session: &SessionHandle) -> Result<(), ClientError>;

    /// Creates a subscription publishing at `publishing_interval`.
    async fn create_subscription(
        &self,
        session: &SessionHandle,
        publishing_interval: Duration,
    ) -> Result<SubscriptionHandle, ClientError>;

    /// Adds `tags` as monitored items of `subscription`.
    async fn add_monitored_items(
        &self,
        session: &SessionHandle,
        subscription: &SubscriptionHandle,
        tags: &[MonitoredTag],
    ) -> Result<(), ClientError>;

    /// Registers `subscription` with the session and applies its items.
    async fn add_subscription(
        &self,
        session: &SessionHandle,
        subscription: &SubscriptionHandle,
    ) -> Result<(), ClientError>;

    /// Re-establishes `session` after a transient failure.
    async fn reconnect(&self, session: &SessionHandle) -> Result<ReconnectOutcome, ClientError>;

    /// Closes `session` and releases its resources.
    async fn close_session(&self, session: &SessionHandle) -> Result<(), ClientError>;
}
