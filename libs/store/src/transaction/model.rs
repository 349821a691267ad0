use sqlx::FromRow;

/// Stored transaction. `gas_fee`, `messages` and `response` hold the JSON the
/// unit arrived with.
#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub tx_index: i64,
    pub success: bool,
    pub block_height: i64,
    pub gas_wanted: f64,
    pub gas_used: f64,
    pub memo: String,
    pub gas_fee: String,
    pub messages: String,
    pub response: String,
}
