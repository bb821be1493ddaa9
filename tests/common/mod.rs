#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use linevisor::{
    BootstrapPhase, ClientError, Config, EndpointDescription, Event, MonitoredTag,
    ReconnectOutcome, SessionHandle, SessionSettings, SignalSink, StatusCode, SubscriptionHandle,
    TagConfig, TagValue, TrustPolicy, UaClient,
};

type PhaseHook = Box<dyn FnOnce() + Send>;

/// UaClient whose behaviour is scripted per test.
pub struct ScriptedClient {
    hook: Mutex<Option<(BootstrapPhase, PhaseHook)>>,
    calls: Mutex<Vec<BootstrapPhase>>,
    fail_at: Option<BootstrapPhase>,
    reconnect_failures: AtomicU32,
    reconnects: AtomicU32,
    transfer: AtomicBool,
    next_session: AtomicU64,
    sink: Mutex<Option<SignalSink>>,
    closed: AtomicU32,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            hook: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            fail_at: None,
            reconnect_failures: AtomicU32::new(0),
            reconnects: AtomicU32::new(0),
            transfer: AtomicBool::new(true),
            next_session: AtomicU64::new(1),
            sink: Mutex::new(None),
            closed: AtomicU32::new(0),
        }
    }

    pub fn failing_at(phase: BootstrapPhase) -> Self {
        Self {
            fail_at: Some(phase),
            ..Self::new()
        }
    }

    /// The first `n` reconnect calls fail.
    pub fn with_reconnect_failures(self, n: u32) -> Self {
        self.reconnect_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Reconnect reports the subscription as lost.
    pub fn without_transfer(self) -> Self {
        self.transfer.store(false, Ordering::SeqCst);
        self
    }

    /// Runs `f` once, while the client is serving `phase`.
    pub fn during(&self, phase: BootstrapPhase, f: impl FnOnce() + Send + 'static) {
        *self.hook.lock() = Some((phase, Box::new(f)));
    }

    pub fn calls(&self) -> Vec<BootstrapPhase> {
        self.calls.lock().clone()
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn sink(&self) -> Option<SignalSink> {
        self.sink.lock().clone()
    }

    fn step(&self, phase: BootstrapPhase) -> Result<(), ClientError> {
        self.calls.lock().push(phase);
        let hook = {
            let mut slot = self.hook.lock();
            match slot.as_ref() {
                Some((at, _)) if *at == phase => slot.take().map(|(_, f)| f),
                _ => None,
            }
        };
        if let Some(f) = hook {
            f();
        }
        if self.fail_at == Some(phase) {
            return Err(ClientError::Status {
                status: StatusCode::BAD_COMMUNICATION_ERROR,
                message: format!("scripted failure at {phase}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UaClient for ScriptedClient {
    async fn create_application(&self, _trust: TrustPolicy) -> Result<(), ClientError> {
        self.step(BootstrapPhase::CreateApplication)
    }

    async fn discover_endpoints(&self, endpoint: &str) -> Result<EndpointDescription, ClientError> {
        self.step(BootstrapPhase::DiscoverEndpoints)?;
        Ok(EndpointDescription {
            url: endpoint.to_string(),
            security_policy: "None".to_string(),
        })
    }

    async fn create_session(
        &self,
        endpoint: &EndpointDescription,
        sink: SignalSink,
    ) -> Result<SessionHandle, ClientError> {
        self.step(BootstrapPhase::CreateSession)?;
        *self.sink.lock() = Some(sink);
        Ok(SessionHandle {
            id: self.next_session.fetch_add(1, Ordering::SeqCst),
            endpoint: Arc::from(endpoint.url.as_str()),
        })
    }

    async fn browse_namespace(&self, _session: &SessionHandle) -> Result<(), ClientError> {
        self.step(BootstrapPhase::BrowseNamespace)
    }

    async fn create_subscription(
        &self,
        _session: &SessionHandle,
        _publishing_interval: Duration,
    ) -> Result<SubscriptionHandle, ClientError> {
        self.step(BootstrapPhase::CreateSubscription)?;
        Ok(SubscriptionHandle { id: 7 })
    }

    async fn add_monitored_items(
        &self,
        _session: &SessionHandle,
        _subscription: &SubscriptionHandle,
        _tags: &[MonitoredTag],
    ) -> Result<(), ClientError> {
        self.step(BootstrapPhase::AddMonitoredItems)
    }

    async fn add_subscription(
        &self,
        _session: &SessionHandle,
        _subscription: &SubscriptionHandle,
    ) -> Result<(), ClientError> {
        self.step(BootstrapPhase::AddSubscription)
    }

    async fn reconnect(&self, session: &SessionHandle) -> Result<ReconnectOutcome, ClientError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .reconnect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::Connection("server unreachable".into()));
        }
        Ok(ReconnectOutcome {
            session: SessionHandle {
                id: self.next_session.fetch_add(1, Ordering::SeqCst),
                endpoint: Arc::clone(&session.endpoint),
            },
            subscription_transferred: self.transfer.load(Ordering::SeqCst),
        })
    }

    async fn close_session(&self, _session: &SessionHandle) -> Result<(), ClientError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn tag(name: &str, line: &str) -> TagConfig {
    TagConfig {
        display_name: name.to_string(),
        address: format!("ns=2;s={name}"),
        line: Some(line.to_string()),
        down: vec![TagValue::Int(0)],
        running: vec![TagValue::Int(1)],
    }
}

pub fn config() -> Config {
    Config {
        endpoint: "opc.tcp://plc-test:4840".to_string(),
        tags: vec![tag("Line1.State", "Line1"), tag("Line2.State", "Line2")],
        ..Config::default()
    }
}

pub fn settings(reconnect_period: Duration) -> SessionSettings {
    let mut cfg = config();
    cfg.reconnect_period_secs = reconnect_period.as_secs();
    cfg.session_settings()
}

/// Drains everything currently buffered in a bus receiver.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Polls `check` until it returns true or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Waits until the client has been handed its signal sink.
pub async fn sink_of(client: &ScriptedClient) -> SignalSink {
    for _ in 0..500 {
        if let Some(sink) = client.sink() {
            return sink;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session was never created");
}
