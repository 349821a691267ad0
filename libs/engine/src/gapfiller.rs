use chain::model::Height;
use eyre::Result;
use store::block::store::Store as BlockStore;

use crate::checkpointer::Checkpointer;

#[derive(Clone, Debug)]
pub struct GapfillerConfig {
    /// Heights covered by one count query.
    pub batch_size: u64,
    /// Lowest height ever expected in the store.
    pub floor: Height,
}

impl Default for GapfillerConfig {
    fn default() -> Self {
        Self { batch_size: 1000, floor: 1 }
    }
}

/// Finds where block continuity breaks.
pub struct Gapfiller {
    blocks: BlockStore,
    checkpointer: Checkpointer,
    config: GapfillerConfig,
}

impl Gapfiller {
    pub fn new(blocks: BlockStore, checkpointer: Checkpointer, config: GapfillerConfig) -> Self {
        Self { blocks, checkpointer, config }
    }

    /// Where the next scan starts: the gap the last scan stopped at, or the
    /// configured floor when no scan has been recorded.
    pub async fn floor(&self) -> Result<Height> {
        let recorded = self.checkpointer.get_last_checkpoint().await?;
        let recorded = recorded.map(|checkpoint| checkpoint.being_block.max(0) as u64);
        Ok(recorded.unwrap_or(0).max(self.config.floor).max(1))
    }

    /// First height below `ceiling` that has no stored block, scanning up from
    /// [`Gapfiller::floor`]. Returns `ceiling` when nothing below it is missing.
    pub async fn find_first_gap(&self, ceiling: Height) -> Result<Height> {
        let floor = self.floor().await?;
        self.find_first_gap_from(floor, ceiling).await
    }

    pub async fn find_first_gap_from(&self, floor: Height, ceiling: Height) -> Result<Height> {
        let batch_size = self.config.batch_size.max(1);
        let mut start = floor.max(1);

        tracing::debug!(floor = start, ceiling, "Gap scan started");

        while start < ceiling {
            let end = start.saturating_add(batch_size - 1).min(ceiling - 1);
            let expected = end - start + 1;

            // Dense batch: skip it without reading rows
            if self.blocks.count_blocks_between(start, end).await? >= expected {
                start = end + 1;
                continue;
            }

            let mut next = start;
            for height in self.blocks.get_heights_between(start, end).await? {
                if height != next {
                    break;
                }
                next += 1;
            }

            tracing::info!(gap = next, ceiling, "Gap found");
            return Ok(next);
        }

        tracing::info!(ceiling, "No gap below ceiling");
        Ok(ceiling)
    }
}
