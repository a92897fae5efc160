//! Message-bus bridge.
//!
//! The only component allowed to block or await. It drains the registry's
//! non-blocking transition sink, maps each gate id to its topic family,
//! and republishes the event to an external bus. Fully decoupled from the
//! hot path: the admission pipeline never waits on it.
//!
//! The bridge owns its shutdown (a watch channel flips on teardown) and
//! bounds remote reset-signature verification round trips with a timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use trivium_gate::{ResetRequest, TransitionEvent};
use trivium_types::GateId;

/// Errors surfaced by the bridge and its collaborators.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("bus publish failed: {0}")]
    PublishFailed(String),

    #[error("reset verification timed out after {0:?}")]
    VerificationTimeout(Duration),

    #[error("remote verifier rejected the reset request")]
    VerificationRejected,
}

/// Topic-naming convention for one gate id.
///
/// `trivium.gate.<id>.transitions` carries state transitions;
/// `.triggers` and `.fields` carry trigger and field-update events for
/// collaborators that republish those.
#[derive(Clone, Debug)]
pub struct TopicMap {
    prefix: String,
}

impl TopicMap {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn transitions(&self, gate_id: &GateId) -> String {
        format!("{}.gate.{}.transitions", self.prefix, gate_id)
    }

    pub fn triggers(&self, gate_id: &GateId) -> String {
        format!("{}.gate.{}.triggers", self.prefix, gate_id)
    }

    pub fn field_updates(&self, gate_id: &GateId) -> String {
        format!("{}.gate.{}.fields", self.prefix, gate_id)
    }
}

impl Default for TopicMap {
    fn default() -> Self {
        Self::new("trivium")
    }
}

/// Seam to the external message bus.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BridgeError>;
}

/// Seam to an external reset-signature verification service.
#[async_trait]
pub trait RemoteResetVerifier: Send + Sync {
    async fn verify(&self, request: &ResetRequest) -> Result<(), BridgeError>;
}

/// Republishes gate transitions until the sink closes or shutdown flips.
pub struct Bridge {
    events: mpsc::UnboundedReceiver<TransitionEvent>,
    publisher: Arc<dyn BusPublisher>,
    topics: TopicMap,
    shutdown: watch::Receiver<bool>,
}

impl Bridge {
    pub fn new(
        events: mpsc::UnboundedReceiver<TransitionEvent>,
        publisher: Arc<dyn BusPublisher>,
        topics: TopicMap,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            events,
            publisher,
            topics,
            shutdown,
        }
    }

    /// Drain and republish until shutdown. Publish failures are logged and
    /// skipped; the bus being down must never wedge the bridge.
    pub async fn run(mut self) {
        info!("bridge started");
        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => self.republish(event).await,
                        None => {
                            info!("transition sink closed, bridge stopping");
                            break;
                        }
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("shutdown signalled, bridge stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn republish(&self, event: TransitionEvent) {
        let topic = self.topics.transitions(&event.gate_id);
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "transition event failed to serialize, dropping");
                return;
            }
        };
        match self.publisher.publish(&topic, &payload).await {
            Ok(()) => debug!(topic = %topic, from = %event.from, to = %event.to, "transition published"),
            Err(error) => warn!(topic = %topic, %error, "publish failed, event dropped"),
        }
    }
}

/// Bound a remote reset verification round trip.
pub async fn verify_reset_with_timeout(
    verifier: &dyn RemoteResetVerifier,
    request: &ResetRequest,
    budget: Duration,
) -> Result<(), BridgeError> {
    match tokio::time::timeout(budget, verifier.verify(request)).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::VerificationTimeout(budget)),
    }
}

/// In-memory bus for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    published: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        match self.published.lock() {
            Ok(published) => published.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl BusPublisher for InMemoryBus {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BridgeError> {
        let mut published = match self.published.lock() {
            Ok(published) => published,
            Err(poisoned) => poisoned.into_inner(),
        };
        published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
