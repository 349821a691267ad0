use std::num::ParseIntError;

/// Why a unit could not be applied to the ledger. Everything except
/// `Database` is a problem with the unit itself and will not go away on retry.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transfer event in tx {tx_hash} has unparseable value `{value}`: {source}")]
    InvalidValue {
        tx_hash: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("transfer event in tx {tx_hash} has negative value {value}")]
    NegativeValue { tx_hash: String, value: i64 },

    #[error("debit of {amount} would take account ({address}, {token}) below zero")]
    NegativeBalance { address: String, token: String, amount: i64 },

    #[error("failed to encode {record}: {source}")]
    Encode {
        record: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn is_data_error(&self) -> bool {
        !matches!(self, LedgerError::Database(_))
    }
}
