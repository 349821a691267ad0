use chain::model::Height;
use eyre::{Result, eyre};
use store::checkpoint::model::RestoreCheckpoint;
use store::checkpoint::store::Store as CheckpointStore;
use store::client::Client;
use store::utils;

/// Reads and records gap-scan progress.
#[derive(Clone)]
pub struct Checkpointer {
    store: CheckpointStore,
}

impl Checkpointer {
    pub fn new(client: Client) -> Self {
        Self { store: CheckpointStore::new(client) }
    }

    pub async fn get_last_checkpoint(&self) -> Result<Option<RestoreCheckpoint>> {
        Ok(self.store.get_restore_checkpoint().await?)
    }

    pub async fn checkpoint(
        &self,
        range_start: Height,
        range_end: Height,
        being_block: Height,
    ) -> Result<RestoreCheckpoint> {
        let checkpoint = RestoreCheckpoint {
            restore_range_start: utils::height_to_i64(range_start)?,
            restore_range_end: utils::height_to_i64(range_end)?,
            being_block: utils::height_to_i64(being_block)?,
        };

        match self.store.upsert_restore_checkpoint(&checkpoint).await {
            Ok(()) => {
                tracing::info!("Restore checkpoint saved: {checkpoint}");
                Ok(checkpoint)
            }
            Err(e) => {
                tracing::error!("Checkpointer failed on [upsert_restore_checkpoint]: {e:?}");
                Err(eyre!(e))
            }
        }
    }
}
