use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Append-only audit record of one transfer-class event.
#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct Transfer {
    pub tx_hash: String,
    pub func: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub token: String,
    pub amount: i64,
    pub denom: String,
    pub created_at: DateTime<Utc>,
}
