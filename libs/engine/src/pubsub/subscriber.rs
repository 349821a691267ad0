use broker::handler::{Handler, handler};
use chain::model::BlockWithTransactions;
use eyre::eyre;
use std::sync::Arc;
use sync::pool::{PoolConfig, PoolSender, Submitted, WorkerPool};
use tokio::sync::broadcast;

use crate::sink::handle::Sink;

pub fn spawn_unit_consumers(
    config: &PoolConfig,
    shutdown_tx: broadcast::Sender<()>,
    sink: Arc<dyn Sink<Item = BlockWithTransactions>>,
) -> WorkerPool<BlockWithTransactions> {
    // A closure that returns a future.
    let consumer_callback = move |unit: BlockWithTransactions| {
        let sink_for_consumer = Arc::clone(&sink);
        async move { sink_for_consumer.process(&unit).await }
    };

    WorkerPool::spawn(config, shutdown_tx, consumer_callback)
}

/// Broker handler that decodes each payload and hands it to the worker pool.
/// Undecodable payloads are acknowledged and logged, since no redelivery
/// would fix them.
pub fn unit_handler(pool: PoolSender<BlockWithTransactions>) -> Handler {
    handler(move |payload: Vec<u8>| {
        let pool = pool.clone();
        async move {
            let unit = match BlockWithTransactions::from_bytes(&payload) {
                Ok(unit) => unit,
                Err(e) => {
                    tracing::error!(bytes = payload.len(), "Dropping undecodable unit: {e:?}");
                    return Ok(());
                }
            };

            let height = unit.height();
            match pool.submit(unit).await {
                Ok(Submitted::Queued) => Ok(()),
                Ok(Submitted::Dropped) => {
                    tracing::warn!(height, "Unit dropped by full worker pool");
                    Ok(())
                }
                Err(e) => Err(eyre!("unit {height} not queued: {e}")),
            }
        }
    })
}
