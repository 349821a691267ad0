use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::config::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::handler::Handler;
use crate::poller::Poller;
use crate::substrate::handle::QueueSubstrate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub topic: String,
    pub queue: String,
}

#[async_trait::async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> BrokerResult<()>;

    /// Binds a fresh queue to `topic` and starts delivering to `handler`.
    /// The queue is deleted again when the broker closes.
    async fn subscribe(&self, topic: &str, handler: Handler) -> BrokerResult<Subscription>;

    /// Like [`MessageBroker::subscribe`], but reuses the queue called `queue`
    /// if it exists, so messages published while nobody polled it are kept.
    async fn subscribe_named(
        &self,
        topic: &str,
        queue: &str,
        handler: Handler,
    ) -> BrokerResult<Subscription>;

    /// Stops all pollers, waiting a bounded time for in-flight handlers, then
    /// deletes the queues created by [`MessageBroker::subscribe`].
    async fn close(&self) -> BrokerResult<()>;
}

#[derive(Default)]
struct BrokerState {
    topics: HashSet<String>,
    subscriptions: HashMap<String, Vec<String>>,
    pollers: Vec<JoinHandle<()>>,
    anonymous: Vec<String>,
    closed: bool,
}

/// Topic/queue broker over a [`QueueSubstrate`]. One instance per process,
/// shared by reference with everything that publishes or subscribes.
pub struct TopicBroker<S> {
    substrate: Arc<S>,
    config: BrokerConfig,
    state: Mutex<BrokerState>,
    shutdown_tx: broadcast::Sender<()>,
    queue_seq: AtomicU64,
}

impl<S: QueueSubstrate> TopicBroker<S> {
    pub fn new(substrate: S, config: BrokerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            substrate: Arc::new(substrate),
            config,
            state: Mutex::new(BrokerState::default()),
            shutdown_tx,
            queue_seq: AtomicU64::new(0),
        }
    }

    pub fn substrate(&self) -> &Arc<S> {
        &self.substrate
    }

    /// Queues this broker has subscribed to `topic`.
    pub async fn subscriptions(&self, topic: &str) -> Vec<String> {
        self.state.lock().await.subscriptions.get(topic).cloned().unwrap_or_default()
    }

    async fn ensure_topic(&self, state: &mut BrokerState, topic: &str) -> BrokerResult<()> {
        if !state.topics.contains(topic) {
            self.substrate.create_topic(topic).await?;
            state.topics.insert(topic.to_string());
            tracing::debug!(topic, "Topic created");
        }
        Ok(())
    }

    async fn attach(
        &self,
        topic: &str,
        queue: &str,
        handler: Handler,
        anonymous: bool,
    ) -> BrokerResult<Subscription> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(BrokerError::Closed);
        }
        if state.subscriptions.values().flatten().any(|subscribed| subscribed == queue) {
            return Err(BrokerError::DuplicateSubscription(queue.to_string()));
        }

        self.ensure_topic(&mut state, topic).await?;
        self.substrate.create_queue(queue).await?;
        self.substrate.bind(topic, queue).await?;

        let poller = Poller::new(
            Arc::clone(&self.substrate),
            queue.to_string(),
            handler,
            self.config.clone(),
        );
        state.pollers.push(poller.spawn(&self.shutdown_tx));
        state.subscriptions.entry(topic.to_string()).or_default().push(queue.to_string());
        if anonymous {
            state.anonymous.push(queue.to_string());
        }

        tracing::info!(topic, queue, anonymous, "Subscribed");
        Ok(Subscription { topic: topic.to_string(), queue: queue.to_string() })
    }

    async fn stop_pollers(&self, pollers: Vec<JoinHandle<()>>) {
        if pollers.is_empty() {
            return;
        }
        let _ = self.shutdown_tx.send(());

        let abort_handles: Vec<_> = pollers.iter().map(JoinHandle::abort_handle).collect();
        if tokio::time::timeout(self.config.close_timeout, join_all(pollers)).await.is_err() {
            tracing::warn!(
                timeout = ?self.config.close_timeout,
                "Pollers still busy at close timeout, abandoning them"
            );
            for handle in abort_handles {
                handle.abort();
            }
        }
    }

    fn fresh_queue_name(&self, topic: &str) -> String {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        let seq = self.queue_seq.fetch_add(1, Ordering::Relaxed);
        format!("{topic}-queue-{nanos}-{seq}")
    }
}

#[async_trait::async_trait]
impl<S: QueueSubstrate> MessageBroker for TopicBroker<S> {
    async fn publish(&self, topic: &str, payload: &[u8]) -> BrokerResult<()> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(BrokerError::Closed);
            }
            self.ensure_topic(&mut state, topic).await?;
        }

        let queues = self.substrate.publish(topic, payload).await?;
        tracing::debug!(topic, queues, bytes = payload.len(), "Published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Handler) -> BrokerResult<Subscription> {
        let queue = self.fresh_queue_name(topic);
        self.attach(topic, &queue, handler, true).await
    }

    async fn subscribe_named(
        &self,
        topic: &str,
        queue: &str,
        handler: Handler,
    ) -> BrokerResult<Subscription> {
        self.attach(topic, queue, handler, false).await
    }

    async fn close(&self) -> BrokerResult<()> {
        let (pollers, anonymous) = {
            let mut state = self.state.lock().await;
            state.closed = true;
            let anonymous = std::mem::take(&mut state.anonymous);
            for queues in state.subscriptions.values_mut() {
                queues.retain(|queue| !anonymous.contains(queue));
            }
            (std::mem::take(&mut state.pollers), anonymous)
        };

        self.stop_pollers(pollers).await;

        for queue in &anonymous {
            match self.substrate.delete_queue(queue).await {
                Ok(_) => tracing::debug!(queue, "Queue deleted"),
                Err(e) => tracing::warn!(queue, error = %e, "Failed to delete queue"),
            }
        }
        tracing::info!(deleted = anonymous.len(), "Broker closed");
        Ok(())
    }
}
