use sqlx::Error;

use crate::{block::model::Block, utils};

impl TryFrom<&chain::model::Block> for Block {
    type Error = Error;

    fn try_from(block: &chain::model::Block) -> Result<Self, Self::Error> {
        Ok(Block {
            height: utils::height_to_i64(block.height)?,
            hash: block.hash.clone(),
            time: block.time,
            total_txs: block.total_txs,
            num_txs: block.num_txs,
        })
    }
}
