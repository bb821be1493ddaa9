//! # SimClient: in-process telemetry source.
//!
//! A [`UaClient`] with no network underneath. Every bootstrap phase succeeds;
//! once the subscription is added a feed task pushes a good keep-alive and one
//! random tag value per publishing interval. Values are drawn from each tag's
//! configured down and running values, so lines flip between states.
//!
//! Used by the binary's `--simulate` mode and for local runs without a server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatch::TagValue;
use crate::error::ClientError;

use super::client::{
    EndpointDescription, MonitoredTag, ReconnectOutcome, SessionHandle, SubscriptionHandle,
    UaClient,
};
use super::signal::{KeepAlive, SignalSink, TagNotification};
use super::status::StatusCode;
use super::trust::TrustPolicy;

/// Candidate values of one simulated tag.
#[derive(Debug, Clone)]
pub struct SimTag {
    pub display_name: Arc<str>,
    pub values: Vec<TagValue>,
}

struct Feed {
    sink: Option<SignalSink>,
    interval: Duration,
    tags: Vec<MonitoredTag>,
    token: Option<CancellationToken>,
}

/// Simulated protocol client.
pub struct SimClient {
    catalog: Vec<SimTag>,
    next_session: AtomicU64,
    feed: Mutex<Feed>,
}

impl SimClient {
    pub fn new(catalog: Vec<SimTag>) -> Self {
        Self {
            catalog,
            next_session: AtomicU64::new(1),
            feed: Mutex::new(Feed {
                sink: None,
                interval: Duration::from_secs(1),
                tags: Vec::new(),
                token: None,
            }),
        }
    }

    /// Builds the catalog from the configured tags and their value sets.
    pub fn from_config(cfg: &Config) -> Self {
        let catalog = cfg
            .tags
            .iter()
            .map(|t| SimTag {
                display_name: Arc::from(t.display_name.as_str()),
                values: t.down.iter().chain(t.running.iter()).cloned().collect(),
            })
            .collect();
        Self::new(catalog)
    }

    fn spawn_feed(&self) {
        let mut feed = self.feed.lock();
        if let Some(old) = feed.token.take() {
            old.cancel();
        }
        let Some(sink) = feed.sink.clone() else {
            return;
        };

        let monitored: Vec<SimTag> = self
            .catalog
            .iter()
            .filter(|c| feed.tags.iter().any(|t| t.display_name == c.display_name))
            .filter(|c| !c.values.is_empty())
            .cloned()
            .collect();
        let interval = feed.interval;
        let token = CancellationToken::new();
        feed.token = Some(token.clone());

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = token.cancelled() => break,
                }
                if !sink.keep_alive(KeepAlive::good()) {
                    break;
                }
                let Some(notification) = pick(&monitored) else {
                    continue;
                };
                if !sink.notify(notification) {
                    break;
                }
            }
        });
    }
}

fn pick(tags: &[SimTag]) -> Option<TagNotification> {
    if tags.is_empty() {
        return None;
    }
    let mut rng = rand::rng();
    let tag = &tags[rng.random_range(0..tags.len())];
    let value = tag.values[rng.random_range(0..tag.values.len())].clone();
    Some(TagNotification::new(
        Arc::clone(&tag.display_name),
        value,
        Utc::now(),
    ))
}

#[async_trait]
impl UaClient for SimClient {
    async fn create_application(&self, trust: TrustPolicy) -> Result<(), ClientError> {
        if trust.validate("CN=linevisor-sim", StatusCode::BAD_CERTIFICATE_UNTRUSTED) {
            Ok(())
        } else {
            Err(ClientError::CertificateRejected {
                subject: "CN=linevisor-sim".to_string(),
            })
        }
    }

    async fn discover_endpoints(&self, endpoint: &str) -> Result<EndpointDescription, ClientError> {
        Ok(EndpointDescription {
            url: endpoint.to_string(),
            security_policy: "http://opcfoundation.org/UA/SecurityPolicy#None".to_string(),
        })
    }

    async fn create_session(
        &self,
        endpoint: &EndpointDescription,
        sink: SignalSink,
    ) -> Result<SessionHandle, ClientError> {
        self.feed.lock().sink = Some(sink);
        Ok(SessionHandle {
            id: self.next_session.fetch_add(1, Ordering::SeqCst),
            endpoint: Arc::from(endpoint.url.as_str()),
        })
    }

    async fn browse_namespace(&self, _session: &SessionHandle) -> Result<(), ClientError> {
        Ok(())
    }

    async fn create_subscription(
        &self,
        _session: &SessionHandle,
        publishing_interval: Duration,
    ) -> Result<SubscriptionHandle, ClientError> {
        self.feed.lock().interval = publishing_interval.max(Duration::from_millis(1));
        Ok(SubscriptionHandle { id: 1 })
    }

    async fn add_monitored_items(
        &self,
        _session: &SessionHandle,
        _subscription: &SubscriptionHandle,
        tags: &[MonitoredTag],
    ) -> Result<(), ClientError> {
        self.feed.lock().tags = tags.to_vec();
        Ok(())
    }

    async fn add_subscription(
        &self,
        _session: &SessionHandle,
        _subscription: &SubscriptionHandle,
    ) -> Result<(), ClientError> {
        self.spawn_feed();
        Ok(())
    }

    async fn reconnect(&self, session: &SessionHandle) -> Result<ReconnectOutcome, ClientError> {
        Ok(ReconnectOutcome {
            session: session.clone(),
            subscription_transferred: true,
        })
    }

    async fn close_session(&self, _session: &SessionHandle) -> Result<(), ClientError> {
        let mut feed = self.feed.lock();
        if let Some(token) = feed.token.take() {
            token.cancel();
        }
        feed.sink = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use crate::session::SessionSignal;

    fn catalog() -> Vec<SimTag> {
        vec![SimTag {
            display_name: Arc::from("Line1"),
            values: vec![TagValue::Int(0), TagValue::Int(1)],
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn feed_runs_after_subscription_and_stops_on_close() {
        let client = SimClient::new(catalog());
        let (sink, mut rx) = SignalSink::channel();

        client
            .create_application(TrustPolicy::new(true, Bus::new(8)))
            .await
            .unwrap();
        let ep = client.discover_endpoints("opc.tcp://sim:4840").await.unwrap();
        let session = client.create_session(&ep, sink).await.unwrap();
        let sub = client
            .create_subscription(&session, Duration::from_millis(100))
            .await
            .unwrap();
        let tags = vec![MonitoredTag {
            display_name: Arc::from("Line1"),
            address: "ns=2;s=Line1.State".into(),
        }];
        client.add_monitored_items(&session, &sub, &tags).await.unwrap();
        client.add_subscription(&session, &sub).await.unwrap();

        assert!(matches!(rx.recv().await, Some(SessionSignal::KeepAlive(_))));
        match rx.recv().await {
            Some(SessionSignal::Notification(n)) => {
                assert_eq!(&*n.tag, "Line1");
                assert!(matches!(n.value, TagValue::Int(0) | TagValue::Int(1)));
            }
            other => panic!("expected notification, got {other:?}"),
        }

        client.close_session(&session).await.unwrap();
        // Feed task holds the last sender; once it exits the channel closes.
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn strict_trust_rejects_the_simulated_certificate() {
        let client = SimClient::new(catalog());
        let err = client
            .create_application(TrustPolicy::new(false, Bus::new(8)))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "certificate_rejected");
    }
}
