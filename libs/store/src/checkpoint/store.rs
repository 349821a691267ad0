use eyre::Result;
use sqlx::Error;

use crate::checkpoint::model::RestoreCheckpoint;
use crate::client::Client;

const CHECKPOINT_ID: i64 = 1;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // RESTORE CHECKPOINT
    // ---------------------------

    pub async fn upsert_restore_checkpoint(&self, checkpoint: &RestoreCheckpoint) -> Result<(), Error> {
        let query = r#"
            INSERT INTO restore_checkpoint (id, restore_range_start, restore_range_end, being_block)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                restore_range_start = excluded.restore_range_start,
                restore_range_end = excluded.restore_range_end,
                being_block = excluded.being_block
            "#;
        sqlx::query(query)
            .bind(CHECKPOINT_ID)
            .bind(checkpoint.restore_range_start)
            .bind(checkpoint.restore_range_end)
            .bind(checkpoint.being_block)
            .execute(self.client.pool())
            .await?;
        Ok(())
    }

    pub async fn get_restore_checkpoint(&self) -> Result<Option<RestoreCheckpoint>, Error> {
        let query = r#"
            SELECT restore_range_start, restore_range_end, being_block
            FROM restore_checkpoint
            WHERE id = ?
            "#;
        let checkpoint =
            sqlx::query_as(query).bind(CHECKPOINT_ID).fetch_optional(self.client.pool()).await?;

        Ok(checkpoint)
    }
}
