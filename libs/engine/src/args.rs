use std::time::Duration;

use chain::model::BLOCK_WITH_TXS_TOPIC;
use sync::pool::PoolConfig;

#[derive(Clone, Debug)]
pub struct Args {
    pub topic: String,
    /// Durable queue to consume from. A fresh queue is bound when unset.
    pub subscription: Option<String>,
    pub pool: PoolConfig,
    /// How long shutdown lets workers drain buffered units.
    pub drain_timeout: Duration,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            topic: BLOCK_WITH_TXS_TOPIC.to_string(),
            subscription: None,
            pool: PoolConfig::default(),
            drain_timeout: Duration::from_secs(30),
        }
    }
}
