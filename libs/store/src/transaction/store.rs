use chain::model::Height;
use sqlx::{Error, QueryBuilder, Sqlite, SqliteConnection};

use crate::client::Client;
use crate::transaction::model::Transaction;
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
    // TRANSACTIONS
    // ---------------------------

    pub async fn insert_transactions(
        &self,
        conn: &mut SqliteConnection,
        transactions: &[Transaction],
    ) -> Result<(), Error> {
        for chunk in transactions.chunks(utils::INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO transactions (hash, tx_index, success, block_height, gas_wanted, gas_used, memo, gas_fee, messages, response) ",
            );
            builder.push_values(chunk, |mut row, tx| {
                row.push_bind(&tx.hash)
                    .push_bind(tx.tx_index)
                    .push_bind(tx.success)
                    .push_bind(tx.block_height)
                    .push_bind(tx.gas_wanted)
                    .push_bind(tx.gas_used)
                    .push_bind(&tx.memo)
                    .push_bind(&tx.gas_fee)
                    .push_bind(&tx.messages)
                    .push_bind(&tx.response);
            });
            builder.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    pub async fn get_transactions_by_block(&self, height: Height) -> Result<Vec<Transaction>, Error> {
        let query = r#"
            SELECT
                hash, tx_index, success, block_height, gas_wanted, gas_used,
                memo, gas_fee, messages, response
            FROM transactions
            WHERE block_height = ?
            ORDER BY tx_index ASC
            "#;
        let transactions = sqlx::query_as(query)
            .bind(utils::height_to_i64(height)?)
            .fetch_all(self.client.pool())
            .await?;

        Ok(transactions)
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<Option<Transaction>, Error> {
        let query = r#"
            SELECT
                hash, tx_index, success, block_height, gas_wanted, gas_used,
                memo, gas_fee, messages, response
            FROM transactions
            WHERE hash = ?
            "#;
        let transaction = sqlx::query_as(query).bind(hash).fetch_optional(self.client.pool()).await?;

        Ok(transaction)
    }
}
