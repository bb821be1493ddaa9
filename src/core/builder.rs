use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{NotificationDispatcher, TagMapping};
use crate::downtime::{DowntimeRegistry, SystemTimeSource, TimeSource};
use crate::events::Bus;
use crate::session::{SessionManager, UaClient};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

use super::orchestrator::Orchestrator;

/// Builder for an [`Orchestrator`].
///
/// Without explicit subscribers a [`LogWriter`] is installed; without a clock
/// the system clock is used.
pub struct OrchestratorBuilder {
    cfg: Config,
    client: Arc<dyn UaClient>,
    clock: Option<Arc<dyn TimeSource>>,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
}

impl OrchestratorBuilder {
    pub fn new(cfg: Config, client: Arc<dyn UaClient>) -> Self {
        Self {
            cfg,
            client,
            clock: None,
            subscribers: None,
        }
    }

    /// Clock used for downtime start and end instants.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets event subscribers, replacing the default [`LogWriter`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Wires bus, registry, dispatcher and session manager together.
    pub fn build(self) -> Orchestrator {
        let bus = Bus::new(self.cfg.bus_capacity);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemTimeSource) as Arc<dyn TimeSource>);
        let subscribers = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>]);

        let registry = Arc::new(DowntimeRegistry::with_bus(clock, bus.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&registry),
            TagMapping::from_config(&self.cfg),
            bus.clone(),
        ));
        let session = SessionManager::new(self.client, self.cfg.session_settings(), bus.clone());

        Orchestrator::new(
            self.cfg,
            bus,
            SubscriberSet::new(subscribers),
            registry,
            dispatcher,
            session,
        )
    }
}
