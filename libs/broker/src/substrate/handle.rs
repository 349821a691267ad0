use std::time::Duration;

use crate::error::BrokerResult;

/// Identifies one delivery of a message. A redelivery bumps `generation`,
/// which invalidates receipts handed out before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Receipt {
    pub message_id: i64,
    pub generation: i64,
}

#[derive(Clone, Debug)]
pub struct Delivery {
    pub receipt: Receipt,
    pub payload: Vec<u8>,
}

impl Delivery {
    /// How many times the message has been received, this time included.
    pub fn receive_count(&self) -> i64 {
        self.receipt.generation
    }
}

/// Topics fanning out to queues with visibility-timeout delivery.
#[async_trait::async_trait]
pub trait QueueSubstrate: Send + Sync + 'static {
    async fn create_topic(&self, topic: &str) -> BrokerResult<()>;

    async fn create_queue(&self, queue: &str) -> BrokerResult<()>;

    /// Routes every later publish on `topic` to `queue` as well.
    async fn bind(&self, topic: &str, queue: &str) -> BrokerResult<()>;

    /// Copies `payload` onto every queue bound to `topic` and returns how many.
    async fn publish(&self, topic: &str, payload: &[u8]) -> BrokerResult<usize>;

    /// Long-polls `queue` for up to `wait`. Returned messages stay hidden for
    /// `visibility` unless deleted first.
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
        visibility: Duration,
    ) -> BrokerResult<Vec<Delivery>>;

    /// Acknowledges a delivery. Returns `false` when the receipt is stale.
    async fn delete(&self, queue: &str, receipt: Receipt) -> BrokerResult<bool>;

    /// Drops `queue`, its bindings and every message on it. Returns `false`
    /// when there was no such queue.
    async fn delete_queue(&self, queue: &str) -> BrokerResult<bool>;

    /// Messages on `queue`, hidden ones included.
    async fn depth(&self, queue: &str) -> BrokerResult<usize>;
}
