use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Balance of one token held by one address, in base units.
#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct Account {
    pub address: String,
    pub token: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}
