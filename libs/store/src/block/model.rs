use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct Block {
    pub height: i64,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub total_txs: i64,
    pub num_txs: i64,
}
