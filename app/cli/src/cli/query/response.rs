use serde::{Serialize, ser::SerializeStruct};
use store::account::model::Account;
use store::block::model::Block;
use store::checkpoint::model::RestoreCheckpoint;
use store::transfer::model::Transfer;

// Tuple wrapper for Account
pub struct AccountResponse(pub Account);

impl Serialize for AccountResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let a = &self.0;
        let mut state = serializer.serialize_struct("Account", 4)?;
        state.serialize_field("address", &a.address)?;
        state.serialize_field("token", &a.token)?;
        state.serialize_field("amount", &a.amount)?;
        state.serialize_field("created_at", &a.created_at.to_rfc3339())?;
        state.end()
    }
}

// Tuple wrapper for Transfer
pub struct TransferResponse(pub Transfer);

impl Serialize for TransferResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let t = &self.0;
        let mut state = serializer.serialize_struct("Transfer", 8)?;
        state.serialize_field("tx_hash", &t.tx_hash)?;
        state.serialize_field("func", &t.func)?;
        state.serialize_field("from_address", &t.from_address)?;
        state.serialize_field("to_address", &t.to_address)?;
        state.serialize_field("token", &t.token)?;
        state.serialize_field("amount", &t.amount)?;
        state.serialize_field("denom", &t.denom)?;
        state.serialize_field("created_at", &t.created_at.to_rfc3339())?;
        state.end()
    }
}

// Tuple wrapper for Block
pub struct BlockResponse(pub Block);

impl Serialize for BlockResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let b = &self.0;
        let mut state = serializer.serialize_struct("Block", 5)?;
        state.serialize_field("height", &b.height)?;
        state.serialize_field("hash", &b.hash)?;
        state.serialize_field("time", &b.time.to_rfc3339())?;
        state.serialize_field("total_txs", &b.total_txs)?;
        state.serialize_field("num_txs", &b.num_txs)?;
        state.end()
    }
}

// Tuple wrapper for RestoreCheckpoint
pub struct CheckpointResponse(pub RestoreCheckpoint);

impl Serialize for CheckpointResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let c = &self.0;
        let mut state = serializer.serialize_struct("RestoreCheckpoint", 3)?;
        state.serialize_field("restore_range_start", &c.restore_range_start)?;
        state.serialize_field("restore_range_end", &c.restore_range_end)?;
        state.serialize_field("being_block", &c.being_block)?;
        state.end()
    }
}

#[derive(Serialize)]
pub struct GapResponse {
    pub floor: u64,
    pub ceiling: u64,
    pub gap: u64,
}
