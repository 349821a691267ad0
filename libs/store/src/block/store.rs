use chain::model::Height;
use sqlx::{Error, SqliteConnection};

use crate::block::model::Block;
use crate::client::Client;
use crate::utils;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // BLOCKS
    // ---------------------------

    /// Fails with a unique violation when the height is already stored.
    pub async fn insert_block(&self, conn: &mut SqliteConnection, block: &Block) -> Result<(), Error> {
        let query = r#"
            INSERT INTO blocks (height, hash, time, total_txs, num_txs)
            VALUES (?, ?, ?, ?, ?)
            "#;
        sqlx::query(query)
            .bind(block.height)
            .bind(&block.hash)
            .bind(block.time)
            .bind(block.total_txs)
            .bind(block.num_txs)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Number of stored blocks with `from <= height <= to`.
    pub async fn count_blocks_between(&self, from: Height, to: Height) -> Result<u64, Error> {
        let query = r#"
            SELECT COUNT(*)
            FROM blocks
            WHERE height BETWEEN ? AND ?
            "#;
        let count: i64 = sqlx::query_scalar(query)
            .bind(utils::height_to_i64(from)?)
            .bind(utils::height_to_i64(to)?)
            .fetch_one(self.client.pool())
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Stored heights with `from <= height <= to`, ascending.
    pub async fn get_heights_between(&self, from: Height, to: Height) -> Result<Vec<u64>, Error> {
        let query = r#"
            SELECT height
            FROM blocks
            WHERE height BETWEEN ? AND ?
            ORDER BY height ASC
            "#;
        let heights: Vec<i64> = sqlx::query_scalar(query)
            .bind(utils::height_to_i64(from)?)
            .bind(utils::height_to_i64(to)?)
            .fetch_all(self.client.pool())
            .await?;

        Ok(heights.into_iter().map(|height| height.max(0) as u64).collect())
    }

    pub async fn get_blocks_between(&self, from: Height, to: Height) -> Result<Vec<Block>, Error> {
        let query = r#"
            SELECT height, hash, time, total_txs, num_txs
            FROM blocks
            WHERE height BETWEEN ? AND ?
            ORDER BY height ASC
            "#;
        let blocks = sqlx::query_as(query)
            .bind(utils::height_to_i64(from)?)
            .bind(utils::height_to_i64(to)?)
            .fetch_all(self.client.pool())
            .await?;

        Ok(blocks)
    }

    pub async fn get_block(&self, height: Height) -> Result<Option<Block>, Error> {
        let query = r#"
            SELECT height, hash, time, total_txs, num_txs
            FROM blocks
            WHERE height = ?
            "#;
        let block = sqlx::query_as(query)
            .bind(utils::height_to_i64(height)?)
            .fetch_optional(self.client.pool())
            .await?;

        Ok(block)
    }

    pub async fn get_latest_height(&self) -> Result<Option<u64>, Error> {
        let query = "SELECT MAX(height) FROM blocks";
        let height: Option<i64> = sqlx::query_scalar(query).fetch_one(self.client.pool()).await?;

        Ok(height.map(|height| height.max(0) as u64))
    }
}
