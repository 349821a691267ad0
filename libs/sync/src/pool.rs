use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::consumer::{Consumer, ConsumerCallback};

/// What [`PoolSender::submit`] does when the buffer is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the unit and report it as handled.
    #[default]
    Drop,
    /// Wait for room in the buffer.
    Block,
    /// Fail the submission so the caller can have the unit redelivered.
    Redeliver,
}

#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 5, capacity: 100, overflow: OverflowPolicy::Drop }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Submitted {
    Queued,
    Dropped,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,
    #[error("worker pool buffer is full ({capacity} units)")]
    Full { capacity: usize },
}

/// Cloneable submitting side of a [`WorkerPool`].
pub struct PoolSender<T> {
    tx: mpsc::Sender<T>,
    overflow: OverflowPolicy,
    capacity: usize,
}

impl<T> Clone for PoolSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone(), overflow: self.overflow, capacity: self.capacity }
    }
}

impl<T> PoolSender<T> {
    pub async fn submit(&self, unit: T) -> Result<Submitted, PoolError> {
        if self.overflow == OverflowPolicy::Block {
            self.tx.send(unit).await.map_err(|_| PoolError::Closed)?;
            return Ok(Submitted::Queued);
        }

        match self.tx.try_send(unit) {
            Ok(()) => Ok(Submitted::Queued),
            Err(TrySendError::Full(_)) if self.overflow == OverflowPolicy::Drop => {
                tracing::warn!(capacity = self.capacity, "Worker pool buffer full, unit dropped");
                Ok(Submitted::Dropped)
            }
            Err(TrySendError::Full(_)) => Err(PoolError::Full { capacity: self.capacity }),
            Err(TrySendError::Closed(_)) => Err(PoolError::Closed),
        }
    }
}

/// A bounded buffer drained by a fixed number of [`Consumer`] workers.
pub struct WorkerPool<T> {
    sender: PoolSender<T>,
    handles: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn spawn<E, F, Fut>(
        config: &PoolConfig,
        shutdown_tx: broadcast::Sender<()>,
        consumer_callback_factory: F,
    ) -> Self
    where
        E: Debug + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let capacity = config.capacity.max(1);
        let (tx, rx) = mpsc::channel::<T>(capacity);
        let shared_rx = Arc::new(Mutex::new(rx));

        let consumer_callback: Arc<ConsumerCallback<T, E>> =
            Arc::new(move |unit: T| Box::pin(consumer_callback_factory(unit)));

        let handles = (0..config.workers.max(1))
            .map(|id| {
                Consumer::spawn(
                    id,
                    Arc::clone(&shared_rx),
                    shutdown_tx.clone(),
                    Arc::clone(&consumer_callback),
                )
            })
            .collect();

        tracing::info!(workers = config.workers, capacity, "Worker pool started");

        Self { sender: PoolSender { tx, overflow: config.overflow, capacity }, handles }
    }

    pub fn sender(&self) -> PoolSender<T> {
        self.sender.clone()
    }

    pub async fn submit(&self, unit: T) -> Result<Submitted, PoolError> {
        self.sender.submit(unit).await
    }

    /// Drops the pool's own sender and waits for every worker to exit.
    /// Workers exit once all senders are gone or shutdown is signalled.
    pub async fn close(self) {
        drop(self.sender);
        for handle in self.handles {
            let _ = handle.await;
        }
        tracing::info!("Worker pool closed");
    }
}
