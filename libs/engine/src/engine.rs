use crate::args::Args;
use crate::pubsub::subscriber;
use crate::sink::handle::Sink;
use broker::broker::{MessageBroker, Subscription};
use chain::model::BlockWithTransactions;
use eyre::Result;
use std::sync::Arc;
use sync::pool::WorkerPool;
use tokio::sync::broadcast;

/// The ledger pipeline: one broker subscription feeding a worker pool.
pub struct Engine {
    shutdown_tx: broadcast::Sender<()>,
    broker: Arc<dyn MessageBroker>,
    pool: WorkerPool<BlockWithTransactions>,
    subscription: Subscription,
    args: Args,
}

impl Engine {
    pub async fn start(
        args: &Args,
        broker: Arc<dyn MessageBroker>,
        sink: Arc<dyn Sink<Item = BlockWithTransactions>>,
    ) -> Result<Engine> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let pool = subscriber::spawn_unit_consumers(&args.pool, shutdown_tx.clone(), sink);
        let handler = subscriber::unit_handler(pool.sender());

        let subscription = match &args.subscription {
            Some(queue) => broker.subscribe_named(&args.topic, queue, handler).await,
            None => broker.subscribe(&args.topic, handler).await,
        };
        let subscription = match subscription {
            Ok(subscription) => subscription,
            Err(e) => {
                let _ = shutdown_tx.send(());
                pool.close().await;
                return Err(e.into());
            }
        };

        tracing::info!(topic = %subscription.topic, queue = %subscription.queue, "Engine started");

        Ok(Self { shutdown_tx, broker, pool, subscription, args: args.clone() })
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    // Close the broker so no new units arrive, then let workers drain the buffer
    pub async fn shutdown(self) {
        if let Err(e) = self.broker.close().await {
            tracing::error!("Broker failed on [close]: {e}");
        }

        let drain = self.pool.close();
        tokio::pin!(drain);
        tokio::select! {
            _ = &mut drain => {}
            _ = tokio::time::sleep(self.args.drain_timeout) => {
                tracing::warn!("Workers still busy at drain timeout, stopping them");
                let _ = self.shutdown_tx.send(());
                drain.await;
            }
        }

        tracing::info!("Engine stopped");
    }
}
