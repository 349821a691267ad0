use eyre::Result;

use crate::model::{BlockWithTransactions, Height};

/// Where block units are fetched from during a reconciliation pass.
#[async_trait::async_trait]
pub trait BlockSource: Send + Sync {
    /// Highest height the source knows about, if it knows any.
    async fn latest_height(&self) -> Result<Option<Height>>;

    /// Units with `from <= height < to`, ordered by height.
    async fn fetch_range(&self, from: Height, to: Height) -> Result<Vec<BlockWithTransactions>>;
}
