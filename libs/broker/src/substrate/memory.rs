use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::error::{BrokerError, BrokerResult};
use crate::substrate::handle::{Delivery, QueueSubstrate, Receipt};

struct StoredMessage {
    payload: Vec<u8>,
    visible_at: Instant,
    generation: i64,
}

#[derive(Default)]
struct Queue {
    messages: BTreeMap<i64, StoredMessage>,
    notify: Arc<Notify>,
}

#[derive(Default)]
struct State {
    bindings: HashMap<String, BTreeSet<String>>,
    queues: HashMap<String, Queue>,
    next_message_id: i64,
}

/// Process-local substrate. Messages do not survive the process.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QueueSubstrate for MemoryQueue {
    async fn create_topic(&self, topic: &str) -> BrokerResult<()> {
        self.state.lock().await.bindings.entry(topic.to_string()).or_default();
        Ok(())
    }

    async fn create_queue(&self, queue: &str) -> BrokerResult<()> {
        self.state.lock().await.queues.entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn bind(&self, topic: &str, queue: &str) -> BrokerResult<()> {
        let mut state = self.state.lock().await;
        if !state.queues.contains_key(queue) {
            return Err(BrokerError::UnknownQueue(queue.to_string()));
        }
        state.bindings.entry(topic.to_string()).or_default().insert(queue.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> BrokerResult<usize> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.bindings.contains_key(topic) {
            state.bindings.insert(topic.to_string(), BTreeSet::new());
            return Ok(0);
        }
        let bound = &state.bindings[topic];

        let now = Instant::now();
        let mut fanned_out = 0;
        for queue_name in bound {
            let Some(queue) = state.queues.get_mut(queue_name) else { continue };
            state.next_message_id += 1;
            queue.messages.insert(
                state.next_message_id,
                StoredMessage { payload: payload.to_vec(), visible_at: now, generation: 0 },
            );
            queue.notify.notify_waiters();
            fanned_out += 1;
        }
        Ok(fanned_out)
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
        visibility: Duration,
    ) -> BrokerResult<Vec<Delivery>> {
        let deadline = Instant::now() + wait;

        loop {
            let mut state = self.state.lock().await;
            let stored = state
                .queues
                .get_mut(queue)
                .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))?;

            let now = Instant::now();
            let mut deliveries = Vec::new();
            let mut next_visible: Option<Instant> = None;
            for (id, message) in stored.messages.iter_mut() {
                if message.visible_at > now {
                    let at = message.visible_at;
                    next_visible = Some(next_visible.map_or(at, |next| next.min(at)));
                } else if deliveries.len() < max_messages.max(1) {
                    message.visible_at = now + visibility;
                    message.generation += 1;
                    deliveries.push(Delivery {
                        receipt: Receipt { message_id: *id, generation: message.generation },
                        payload: message.payload.clone(),
                    });
                }
            }

            if !deliveries.is_empty() || now >= deadline {
                return Ok(deliveries);
            }

            // Register for publish wake-ups before releasing the lock.
            let notify = Arc::clone(&stored.notify);
            let notified = notify.notified();
            drop(state);

            let wake_at = next_visible.map_or(deadline, |at| at.min(deadline));
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, queue: &str, receipt: Receipt) -> BrokerResult<bool> {
        let mut state = self.state.lock().await;
        let stored = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))?;

        match stored.messages.get(&receipt.message_id) {
            Some(message) if message.generation == receipt.generation => {
                stored.messages.remove(&receipt.message_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_queue(&self, queue: &str) -> BrokerResult<bool> {
        let mut state = self.state.lock().await;
        for bound in state.bindings.values_mut() {
            bound.remove(queue);
        }
        Ok(state.queues.remove(queue).is_some())
    }

    async fn depth(&self, queue: &str) -> BrokerResult<usize> {
        let state = self.state.lock().await;
        state
            .queues
            .get(queue)
            .map(|stored| stored.messages.len())
            .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_WAIT: Duration = Duration::ZERO;

    #[tokio::test]
    async fn stale_receipt_does_not_delete_redelivered_message() -> BrokerResult<()> {
        let substrate = MemoryQueue::new();
        substrate.create_queue("q").await?;
        substrate.bind("t", "q").await?;
        substrate.publish("t", b"m").await?;

        let first = substrate.receive("q", 1, NO_WAIT, Duration::from_millis(20)).await?;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = substrate.receive("q", 1, NO_WAIT, Duration::from_secs(30)).await?;

        assert_eq!(second[0].receive_count(), 2);
        assert!(!substrate.delete("q", first[0].receipt).await?);
        assert!(substrate.delete("q", second[0].receipt).await?);
        assert_eq!(substrate.depth("q").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn receive_wakes_on_publish() -> BrokerResult<()> {
        let substrate = Arc::new(MemoryQueue::new());
        substrate.create_queue("q").await?;
        substrate.bind("t", "q").await?;

        let receiver = Arc::clone(&substrate);
        let pending = tokio::spawn(async move {
            receiver.receive("q", 10, Duration::from_secs(10), Duration::from_secs(30)).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        substrate.publish("t", b"late").await?;

        let received = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("receive woke up")
            .expect("task joined")?;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].payload, b"late".to_vec());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_queue_is_an_error() {
        let substrate = MemoryQueue::new();
        let received = substrate.receive("missing", 1, NO_WAIT, NO_WAIT).await;
        assert!(matches!(received, Err(BrokerError::UnknownQueue(_))));
    }
}
