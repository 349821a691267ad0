use std::collections::HashSet;
use std::sync::Arc;

use broker::broker::MessageBroker;
use chain::model::{BLOCK_WITH_TXS_TOPIC, Height};
use chain::source::handle::BlockSource;
use eyre::Result;
use store::block::store::Store as BlockStore;

use crate::checkpointer::Checkpointer;
use crate::gapfiller::Gapfiller;
use crate::pubsub::publisher;

#[derive(Clone, Debug)]
pub struct SynchronizerConfig {
    pub topic: String,
    /// Heights fetched from the source per request.
    pub fetch_chunk: u64,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self { topic: BLOCK_WITH_TXS_TOPIC.to_string(), fetch_chunk: 500 }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciled {
    pub floor: Height,
    pub ceiling: Height,
    pub gap: Height,
    pub published: usize,
}

/// Publishes the units the store is missing so the ledger pipeline can
/// apply them.
pub struct Synchronizer {
    blocks: BlockStore,
    gapfiller: Gapfiller,
    checkpointer: Checkpointer,
    source: Arc<dyn BlockSource>,
    broker: Arc<dyn MessageBroker>,
    config: SynchronizerConfig,
}

impl Synchronizer {
    pub fn new(
        blocks: BlockStore,
        gapfiller: Gapfiller,
        checkpointer: Checkpointer,
        source: Arc<dyn BlockSource>,
        broker: Arc<dyn MessageBroker>,
        config: SynchronizerConfig,
    ) -> Self {
        Self { blocks, gapfiller, checkpointer, source, broker, config }
    }

    /// Upper bound (exclusive) of a pass when none is given: one past the
    /// highest height the source knows, else one past the highest stored.
    pub async fn default_ceiling(&self) -> Result<Height> {
        if let Some(latest) = self.source.latest_height().await? {
            return Ok(latest + 1);
        }
        let stored = self.blocks.get_latest_height().await?;
        Ok(stored.map(|height| height + 1).unwrap_or(self.gapfiller.floor().await?))
    }

    pub async fn reconcile(&self, ceiling: Option<Height>) -> Result<Reconciled> {
        let ceiling = match ceiling {
            Some(ceiling) => ceiling,
            None => self.default_ceiling().await?,
        };
        let floor = self.gapfiller.floor().await?;
        let gap = self.gapfiller.find_first_gap_from(floor, ceiling).await?;
        self.checkpointer.checkpoint(floor, ceiling, gap).await?;

        let mut published = 0;
        let chunk = self.config.fetch_chunk.max(1);
        let mut from = gap;
        while from < ceiling {
            let to = from.saturating_add(chunk).min(ceiling);

            let present: HashSet<Height> =
                self.blocks.get_heights_between(from, to - 1).await?.into_iter().collect();
            let missing: Vec<_> = self
                .source
                .fetch_range(from, to)
                .await?
                .into_iter()
                .filter(|unit| !present.contains(&unit.height()))
                .collect();

            if !missing.is_empty() {
                published +=
                    publisher::publish_units(self.broker.as_ref(), &self.config.topic, &missing)
                        .await?;
            }
            tracing::debug!(from, to, published, "Reconciled chunk");
            from = to;
        }

        tracing::info!(floor, ceiling, gap, published, "Reconciliation pass finished");
        Ok(Reconciled { floor, ceiling, gap, published })
    }
}
