use sqlx::Error;

use crate::{transaction::model::Transaction, utils};

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|e| Error::Encode(Box::new(e)))
}

impl TryFrom<&chain::model::Transaction> for Transaction {
    type Error = Error;

    fn try_from(tx: &chain::model::Transaction) -> Result<Self, Self::Error> {
        Ok(Transaction {
            hash: tx.hash.clone(),
            tx_index: tx.index,
            success: tx.success,
            block_height: utils::height_to_i64(tx.block_height)?,
            gas_wanted: tx.gas_wanted,
            gas_used: tx.gas_used,
            memo: tx.memo.clone(),
            gas_fee: to_json(&tx.gas_fee)?,
            messages: to_json(&tx.messages)?,
            response: to_json(&tx.response)?,
        })
    }
}
