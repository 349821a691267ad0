use std::sync::Arc;
use std::time::Duration;

use broker::config::BrokerConfig;
use engine::args::Args as EngineArgs;
use engine::engine::Engine;
use engine::ledger::processor::{LedgerConfig, LedgerProcessor};
use engine::sink::ledger::LedgerSink;
use eyre::Result;
use store::client::Client;
use sync::pool::PoolConfig;

use crate::cli::engine::args::Args;
use crate::cli::{bus, signal};

pub async fn start(args: &Args) -> Result<()> {
    let client = Client::init(&args.db_url).await?;

    let broker_config = BrokerConfig {
        wait_time: Duration::from_secs(args.wait_time),
        visibility_timeout: Duration::from_secs(args.visibility_timeout),
        ..Default::default()
    };
    let broker = bus::open(args.broker_url.as_deref(), &client, broker_config).await?;

    let ledger_config =
        LedgerConfig { denom: args.denom.clone(), balance_policy: args.balance_policy.into() };
    let sink = Arc::new(LedgerSink { processor: LedgerProcessor::new(client, ledger_config) });

    // map CLI args to Engine Args
    let engine_args = EngineArgs {
        topic: args.topic.clone(),
        subscription: args.subscription.clone(),
        pool: PoolConfig {
            workers: args.workers,
            capacity: args.capacity,
            overflow: args.overflow.into(),
        },
        drain_timeout: Duration::from_secs(args.drain_timeout),
    };

    tracing::info!("Starting the engine {engine_args:?}");
    let engine = Engine::start(&engine_args, broker, sink).await?;

    // Wait for SIGINT or SIGTERM
    signal::shutdown_signal().await?;
    tracing::info!("Shutting down engine...");

    engine.shutdown().await;

    Ok(())
}
