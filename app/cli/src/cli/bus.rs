use std::sync::Arc;

use broker::broker::TopicBroker;
use broker::config::BrokerConfig;
use broker::substrate::sqlite::SqliteQueue;
use eyre::Result;
use store::client::Client;

/// Broker over SQLite queue tables. Without a separate `broker_url` the
/// queue tables live next to the ledger in the store database.
pub async fn open(
    broker_url: Option<&str>,
    store: &Client,
    config: BrokerConfig,
) -> Result<Arc<TopicBroker<SqliteQueue>>> {
    let pool = match broker_url {
        Some(url) => Client::new(url).await?.pool().clone(),
        None => store.pool().clone(),
    };
    let substrate = SqliteQueue::init(pool).await?;

    Ok(Arc::new(TopicBroker::new(substrate, config)))
}
