use chrono::{DateTime, Utc};
use eyre::Result;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

pub type Height = u64;

/// Topic carrying [`BlockWithTransactions`] units for the ledger pipeline.
pub const BLOCK_WITH_TXS_TOPIC: &str = "block_with_txs";

/// Native denomination recorded on transfer audit records.
pub const NATIVE_DENOM: &str = "ugnot";

/// Highest height the store can key on.
pub const MAX_HEIGHT: Height = i64::MAX as Height;

/// Heights start at 1 and must fit a signed 64-bit column.
fn deserialize_height<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Height, D::Error> {
    let height = Height::deserialize(deserializer)?;
    if height == 0 || height > MAX_HEIGHT {
        return Err(D::Error::custom(format!("block height {height} out of range 1..={MAX_HEIGHT}")));
    }
    Ok(height)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub hash: String,
    #[serde(deserialize_with = "deserialize_height")]
    pub height: Height,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub total_txs: i64,
    #[serde(default)]
    pub num_txs: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub index: i64,
    pub hash: String,
    pub success: bool,
    #[serde(deserialize_with = "deserialize_height")]
    pub block_height: Height,
    #[serde(default)]
    pub gas_wanted: f64,
    #[serde(default)]
    pub gas_used: f64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub gas_fee: GasFee,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub response: Response,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GasFee {
    pub amount: f64,
    pub denom: String,
}

/// A transaction message. `value` is kept as the raw JSON it arrived as,
/// since its shape depends on `route`/`type_url`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub route: String,
    #[serde(rename = "typeUrl")]
    pub type_url: String,
    #[serde(default)]
    pub value: Option<Box<RawValue>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub func: String,
    #[serde(default)]
    pub pkg_path: String,
    #[serde(default)]
    pub attrs: Vec<Attr>,
}

impl Event {
    /// Value of the first attribute named `key`, if any.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|attr| attr.key == key).map(|attr| attr.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    pub key: String,
    pub value: String,
}

/// The unit published on [`BLOCK_WITH_TXS_TOPIC`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockWithTransactions {
    pub block: Block,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl BlockWithTransactions {
    pub fn height(&self) -> Height {
        self.block.height
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
