use futures_util::FutureExt;
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::{Mutex, broadcast, mpsc};

pub type ConsumerCallback<T, E> =
    dyn Fn(T) -> Pin<Box<dyn Future<Output = Result<(), E>> + Send>> + Send + Sync + 'static;

/// Receiving half shared by every worker of a pool.
pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

pub struct Consumer<T, E> {
    id: usize,
    consumer_callback: Arc<ConsumerCallback<T, E>>,
    rx: SharedReceiver<T>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<T: 'static, E: 'static> Consumer<T, E> {
    pub fn new(
        id: usize,
        consumer_callback: Arc<ConsumerCallback<T, E>>,
        rx: SharedReceiver<T>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self { id, consumer_callback, rx, shutdown_tx }
    }
}

impl<T: Send + 'static, E: Debug + Send + 'static> Consumer<T, E> {
    pub fn spawn(
        id: usize,
        rx: SharedReceiver<T>,
        shutdown_tx: broadcast::Sender<()>,
        consumer_callback: Arc<ConsumerCallback<T, E>>,
    ) -> tokio::task::JoinHandle<()> {
        let consumer = Consumer::new(id, consumer_callback, rx, shutdown_tx);

        tokio::spawn(async move {
            consumer.run().await;
            tracing::debug!(worker = id, "Consumer stopped");
        })
    }

    /// Pulls units until the channel closes or shutdown is signalled.
    /// A unit already pulled is always processed to completion.
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                maybe_unit = async { self.rx.lock().await.recv().await } => {
                    match maybe_unit {
                        Some(unit) => self.consume(unit).await,
                        // Channel closed
                        None => break,
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Shutdown signal received
                    break
                }
            }
        }
    }

    async fn consume(&self, unit: T) {
        let consumer_callback = Arc::clone(&self.consumer_callback);
        match AssertUnwindSafe(consumer_callback(unit)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(worker = self.id, "Consumer failed to process unit: {e:?}"),
            Err(_) => tracing::error!(worker = self.id, "Consumer panicked while processing unit"),
        }
    }
}
