use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::config::BrokerConfig;
use crate::envelope::unwrap_envelope;
use crate::handler::Handler;
use crate::substrate::handle::{Delivery, QueueSubstrate};

/// Long-polls one queue and hands each message to the subscription's handler.
pub struct Poller<S> {
    substrate: Arc<S>,
    queue: String,
    handler: Handler,
    config: BrokerConfig,
}

impl<S: QueueSubstrate> Poller<S> {
    pub fn new(substrate: Arc<S>, queue: String, handler: Handler, config: BrokerConfig) -> Self {
        Self { substrate, queue, handler, config }
    }

    pub fn spawn(self, shutdown_tx: &broadcast::Sender<()>) -> JoinHandle<()> {
        // Subscribe before spawning so a close right after subscribe is seen.
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            self.run(shutdown_rx).await;
            tracing::debug!(queue = %self.queue, "Poller stopped");
        })
    }

    async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        loop {
            let received = tokio::select! {
                _ = shutdown_rx.recv() => break,
                received = self.substrate.receive(
                    &self.queue,
                    self.config.max_messages,
                    self.config.wait_time,
                    self.config.visibility_timeout,
                ) => received,
            };

            match received {
                Ok(deliveries) => {
                    for delivery in deliveries {
                        self.handle(delivery).await;
                        // Unhandled deliveries come back after their visibility timeout.
                        if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(queue = %self.queue, "Failed to receive messages: {e}");
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(self.config.receive_error_backoff) => {}
                    }
                }
            }
        }
    }

    async fn handle(&self, delivery: Delivery) {
        let receive_count = delivery.receive_count();
        let payload = unwrap_envelope(delivery.payload);

        let outcome = AssertUnwindSafe((self.handler)(payload)).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => match self.substrate.delete(&self.queue, delivery.receipt).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    queue = %self.queue,
                    "Receipt expired before acknowledgement, message will be redelivered"
                ),
                Err(e) => tracing::error!(queue = %self.queue, "Failed to delete message: {e}"),
            },
            Ok(Err(e)) => tracing::warn!(
                queue = %self.queue,
                receive_count,
                "Handler failed, message left for redelivery: {e:?}"
            ),
            Err(_) => tracing::error!(
                queue = %self.queue,
                receive_count,
                "Handler panicked, message left for redelivery"
            ),
        }
    }
}
