use std::sync::Arc;

use broker::broker::MessageBroker;
use broker::config::BrokerConfig;
use chain::source::file::FileSource;
use engine::checkpointer::Checkpointer;
use engine::gapfiller::{Gapfiller, GapfillerConfig};
use engine::synchronizer::{Synchronizer, SynchronizerConfig};
use eyre::Result;
use store::block::store::Store as BlockStore;
use store::client::Client;

use crate::cli::bus;
use crate::cli::sync::args::SyncArgs;

pub async fn reconcile(args: &SyncArgs) -> Result<()> {
    let client = Client::init(&args.db_url).await?;
    let broker = bus::open(args.broker_url.as_deref(), &client, BrokerConfig::default()).await?;

    let gapfiller = Gapfiller::new(
        BlockStore::new(client.clone()),
        Checkpointer::new(client.clone()),
        GapfillerConfig { batch_size: args.batch_size, floor: args.floor },
    );
    let synchronizer = Synchronizer::new(
        BlockStore::new(client.clone()),
        gapfiller,
        Checkpointer::new(client),
        Arc::new(FileSource::new(&args.file)),
        broker.clone(),
        SynchronizerConfig { topic: args.topic.clone(), fetch_chunk: args.fetch_chunk },
    );

    let reconciled = synchronizer.reconcile(args.ceiling).await?;
    tracing::info!(
        gap = reconciled.gap,
        ceiling = reconciled.ceiling,
        published = reconciled.published,
        "Sync done"
    );

    broker.close().await?;
    Ok(())
}
