use sqlx::{Error, QueryBuilder, Sqlite, SqliteConnection};

use crate::client::Client;
use crate::transfer::model::Transfer;
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
    // TRANSFERS
    // ---------------------------

    pub async fn insert_transfers(
        &self,
        conn: &mut SqliteConnection,
        transfers: &[Transfer],
    ) -> Result<(), Error> {
        for chunk in transfers.chunks(utils::INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO transfers (tx_hash, func, from_address, to_address, token, amount, denom, created_at) ",
            );
            builder.push_values(chunk, |mut row, transfer| {
                row.push_bind(&transfer.tx_hash)
                    .push_bind(&transfer.func)
                    .push_bind(&transfer.from_address)
                    .push_bind(&transfer.to_address)
                    .push_bind(&transfer.token)
                    .push_bind(transfer.amount)
                    .push_bind(&transfer.denom)
                    .push_bind(transfer.created_at);
            });
            builder.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    pub async fn get_transfers_by_tx_hash(&self, tx_hash: &str) -> Result<Vec<Transfer>, Error> {
        let query = r#"
            SELECT
                tx_hash, func, from_address, to_address, token, amount, denom, created_at
            FROM transfers
            WHERE tx_hash = ?
            ORDER BY id ASC
            "#;
        let transfers = sqlx::query_as(query).bind(tx_hash).fetch_all(self.client.pool()).await?;

        Ok(transfers)
    }

    /// Transfers sent or received by `address`, oldest first.
    pub async fn get_transfers_by_address(&self, address: &str) -> Result<Vec<Transfer>, Error> {
        let query = r#"
            SELECT
                tx_hash, func, from_address, to_address, token, amount, denom, created_at
            FROM transfers
            WHERE from_address = ? OR to_address = ?
            ORDER BY id ASC
            "#;
        let transfers = sqlx::query_as(query)
            .bind(address)
            .bind(address)
            .fetch_all(self.client.pool())
            .await?;

        Ok(transfers)
    }

    pub async fn count_transfers(&self) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
            .fetch_one(self.client.pool())
            .await?;

        Ok(count.max(0) as u64)
    }
}
