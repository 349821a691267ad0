#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use broker::broker::{MessageBroker, TopicBroker};
    use broker::config::BrokerConfig;
    use broker::handler::handler;
    use broker::substrate::handle::QueueSubstrate;
    use broker::substrate::memory::MemoryQueue;
    use chain::model::{
        Attr, Block, BlockWithTransactions, Event, Height, Response, Transaction,
        BLOCK_WITH_TXS_TOPIC,
    };
    use chain::source::handle::BlockSource;
    use chrono::{TimeZone, Utc};
    use engine::args::Args;
    use engine::checkpointer::Checkpointer;
    use engine::engine::Engine;
    use engine::gapfiller::{Gapfiller, GapfillerConfig};
    use engine::ledger::error::LedgerError;
    use engine::ledger::processor::{BalancePolicy, LedgerConfig, LedgerProcessor, Processed};
    use engine::pubsub::publisher;
    use engine::sink::handle::Sink;
    use engine::sink::ledger::LedgerSink;
    use engine::synchronizer::{Synchronizer, SynchronizerConfig};
    use eyre::Result;
    use store::account::store::Store as AccountStore;
    use store::block::{model::Block as BlockRow, store::Store as BlockStore};
    use store::client::Client;
    use store::transaction::store::Store as TransactionStore;
    use store::transfer::store::Store as TransferStore;
    use sync::pool::{OverflowPolicy, PoolConfig, WorkerPool};
    use tokio::sync::{Mutex, Semaphore, broadcast};

    const TOKEN: &str = "gno.land/r/demo/foo20";

    fn fast_config() -> BrokerConfig {
        BrokerConfig {
            wait_time: Duration::from_millis(50),
            visibility_timeout: Duration::from_millis(200),
            max_messages: 10,
            close_timeout: Duration::from_secs(2),
            receive_error_backoff: Duration::from_millis(20),
        }
    }

    async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..300 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn balance_is(
        accounts: &AccountStore,
        address: &str,
        expected: i64,
    ) -> impl Future<Output = bool> + use<> {
        let accounts = accounts.clone();
        let address = address.to_string();
        async move {
            matches!(accounts.find_account(&address, TOKEN).await, Ok(Some(account)) if account.amount == expected)
        }
    }

    fn transfer_event(func: &str, from: &str, to: &str, value: &str) -> Event {
        let attr = |key: &str, value: &str| Attr { key: key.to_string(), value: value.to_string() };
        Event {
            kind: "Transfer".to_string(),
            func: func.to_string(),
            pkg_path: TOKEN.to_string(),
            attrs: vec![attr("from", from), attr("to", to), attr("value", value)],
        }
    }

    fn transaction(hash: &str, height: Height, events: Vec<Event>) -> Transaction {
        Transaction {
            index: 0,
            hash: hash.to_string(),
            success: true,
            block_height: height,
            gas_wanted: 100000.0,
            gas_used: 90000.0,
            memo: String::new(),
            gas_fee: Default::default(),
            messages: Vec::new(),
            response: Response { events, ..Default::default() },
        }
    }

    fn unit(height: Height, transactions: Vec<Transaction>) -> BlockWithTransactions {
        BlockWithTransactions {
            block: Block {
                hash: format!("block-{height}"),
                height,
                time: Utc.with_ymd_and_hms(2025, 7, 11, 15, 7, 12).unwrap(),
                total_txs: transactions.len() as i64,
                num_txs: transactions.len() as i64,
            },
            transactions,
        }
    }

    fn mint(height: Height, to: &str, value: &str) -> BlockWithTransactions {
        let hash = format!("tx-{height}");
        unit(height, vec![transaction(&hash, height, vec![transfer_event("Mint", "", to, value)])])
    }

    async fn insert_heights(client: &Client, heights: &[i64]) -> Result<()> {
        let blocks = BlockStore::new(client.clone());
        let mut conn = client.pool().acquire().await?;
        for &height in heights {
            let row = BlockRow {
                height,
                hash: format!("block-{height}"),
                time: Utc.with_ymd_and_hms(2025, 7, 11, 15, 7, 12).unwrap(),
                total_txs: 0,
                num_txs: 0,
            };
            blocks.insert_block(&mut conn, &row).await?;
        }
        Ok(())
    }

    fn gapfiller(client: &Client, batch_size: u64) -> Gapfiller {
        Gapfiller::new(
            BlockStore::new(client.clone()),
            Checkpointer::new(client.clone()),
            GapfillerConfig { batch_size, ..Default::default() },
        )
    }

    // ---------------------------
    // GAP LOCATOR
    // ---------------------------

    #[tokio::test]
    async fn test_gap_on_empty_store_is_floor() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;

        assert_eq!(gapfiller(&client, 1000).find_first_gap(10).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_gap_on_contiguous_store_is_ceiling() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        insert_heights(&client, &(1..=25).collect::<Vec<_>>()).await?;

        let gapfiller = gapfiller(&client, 7);
        assert_eq!(gapfiller.find_first_gap(26).await?, 26);
        assert_eq!(gapfiller.find_first_gap(10).await?, 10);
        // Floor at or above the ceiling scans nothing
        assert_eq!(gapfiller.find_first_gap_from(30, 26).await?, 26);

        Ok(())
    }

    #[tokio::test]
    async fn test_gap_finds_single_missing_height() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let heights: Vec<i64> = (1..=20).filter(|height| *height != 13).collect();
        insert_heights(&client, &heights).await?;

        assert_eq!(gapfiller(&client, 1000).find_first_gap(21).await?, 13);
        // Missing height sitting on a batch boundary
        assert_eq!(gapfiller(&client, 4).find_first_gap(21).await?, 13);
        assert_eq!(gapfiller(&client, 12).find_first_gap(21).await?, 13);
        assert_eq!(gapfiller(&client, 1).find_first_gap(21).await?, 13);

        Ok(())
    }

    #[tokio::test]
    async fn test_gap_scan_starts_at_recorded_checkpoint() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        insert_heights(&client, &[1, 2, 8, 9, 10]).await?;
        Checkpointer::new(client.clone()).checkpoint(1, 11, 8).await?;

        let gapfiller = gapfiller(&client, 1000);
        assert_eq!(gapfiller.floor().await?, 8);
        assert_eq!(gapfiller.find_first_gap(11).await?, 11);
        assert_eq!(gapfiller.find_first_gap_from(1, 11).await?, 3);

        Ok(())
    }

    // ---------------------------
    // LEDGER
    // ---------------------------

    #[tokio::test]
    async fn test_mint_burn_transfer_balances() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());
        let accounts = AccountStore::new(client.clone());
        let transfers = TransferStore::new(client.clone());

        let burn = unit(2, vec![transaction("tx-2", 2, vec![transfer_event("Burn", "alice", "", "40")])]);
        let send =
            unit(3, vec![transaction("tx-3", 3, vec![transfer_event("Transfer", "alice", "bob", "30")])]);

        assert_eq!(
            processor.process_block_with_transactions(&mint(1, "alice", "100")).await?,
            Processed::Applied { transactions: 1, transfers: 1 }
        );
        processor.process_block_with_transactions(&burn).await?;
        processor.process_block_with_transactions(&send).await?;

        let alice = accounts.find_account("alice", TOKEN).await?.map(|account| account.amount);
        let bob = accounts.find_account("bob", TOKEN).await?.map(|account| account.amount);
        assert_eq!((alice, bob), (Some(30), Some(30)));

        assert_eq!(transfers.count_transfers().await?, 3);
        let records = transfers.get_transfers_by_tx_hash("tx-3").await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].func, "transfer");
        assert_eq!(records[0].from_address.as_deref(), Some("alice"));
        assert_eq!(records[0].to_address.as_deref(), Some("bob"));
        assert_eq!(records[0].amount, 30);
        assert_eq!(records[0].denom, "ugnot");

        Ok(())
    }

    #[tokio::test]
    async fn test_reprocessing_a_unit_is_a_noop() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());
        let accounts = AccountStore::new(client.clone());

        let first = mint(1, "alice", "100");
        processor.process_block_with_transactions(&first).await?;
        assert_eq!(processor.process_block_with_transactions(&first).await?, Processed::Duplicate);

        let alice = accounts.find_account("alice", TOKEN).await?;
        assert_eq!(alice.map(|account| account.amount), Some(100));
        assert_eq!(TransferStore::new(client).count_transfers().await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_value_and_unknown_func_are_recorded() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());

        let events =
            vec![transfer_event("Mint", "", "alice", "0"), transfer_event("Approve", "alice", "bob", "5")];
        let outcome =
            processor.process_block_with_transactions(&unit(1, vec![transaction("tx-1", 1, events)])).await?;

        assert_eq!(outcome, Processed::Applied { transactions: 1, transfers: 2 });
        let accounts = AccountStore::new(client);
        assert_eq!(accounts.find_account("alice", TOKEN).await?.map(|a| a.amount), Some(0));
        assert_eq!(accounts.find_account("bob", TOKEN).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_reject_negative_rolls_back_ledger_effects() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let config =
            LedgerConfig { balance_policy: BalancePolicy::RejectNegative, ..Default::default() };
        let processor = LedgerProcessor::new(client.clone(), config);

        processor.process_block_with_transactions(&mint(1, "carol", "5")).await?;

        let overdraw = unit(
            2,
            vec![
                transaction("tx-2a", 2, vec![transfer_event("Mint", "", "dave", "7")]),
                transaction("tx-2b", 2, vec![transfer_event("Transfer", "carol", "dave", "10")]),
            ],
        );
        let result = processor.process_block_with_transactions(&overdraw).await;
        assert!(matches!(result, Err(LedgerError::NegativeBalance { amount: 10, .. })));

        let accounts = AccountStore::new(client.clone());
        assert_eq!(accounts.find_account("carol", TOKEN).await?.map(|a| a.amount), Some(5));
        assert_eq!(accounts.find_account("dave", TOKEN).await?, None);
        assert_eq!(TransferStore::new(client.clone()).count_transfers().await?, 1);

        // The height itself is indexed and never applied twice
        assert!(BlockStore::new(client).get_block(2).await?.is_some());
        assert_eq!(processor.process_block_with_transactions(&overdraw).await?, Processed::Duplicate);

        Ok(())
    }

    #[tokio::test]
    async fn test_permissive_balance_may_go_negative() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());

        let burn = unit(1, vec![transaction("tx-1", 1, vec![transfer_event("Burn", "erin", "", "3")])]);
        processor.process_block_with_transactions(&burn).await?;

        let erin = AccountStore::new(client).find_account("erin", TOKEN).await?;
        assert_eq!(erin.map(|account| account.amount), Some(-3));

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_value_keeps_block_without_ledger_effects() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());

        let broken = unit(
            1,
            vec![
                transaction("tx-1a", 1, vec![transfer_event("Mint", "", "alice", "50")]),
                transaction("tx-1b", 1, vec![transfer_event("Mint", "", "alice", "abc")]),
            ],
        );

        let result = processor.process_block_with_transactions(&broken).await;
        assert!(matches!(result, Err(LedgerError::InvalidValue { .. })));
        assert!(result.is_err_and(|e| e.is_data_error()));

        let accounts = AccountStore::new(client.clone());
        assert_eq!(accounts.find_account("alice", TOKEN).await?, None);
        assert_eq!(TransferStore::new(client.clone()).count_transfers().await?, 0);

        assert!(BlockStore::new(client.clone()).get_block(1).await?.is_some());
        let rows = TransactionStore::new(client).get_transactions_by_block(1).await?;
        assert_eq!(rows.len(), 2);

        assert_eq!(processor.process_block_with_transactions(&broken).await?, Processed::Duplicate);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_value_is_recorded_as_zero() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());

        let mut no_value = transfer_event("Transfer", "alice", "bob", "1");
        no_value.attrs.retain(|attr| attr.key != "value");
        let outcome = processor
            .process_block_with_transactions(&unit(1, vec![transaction("tx-1", 1, vec![no_value])]))
            .await?;

        assert_eq!(outcome, Processed::Applied { transactions: 1, transfers: 1 });
        let accounts = AccountStore::new(client.clone());
        assert_eq!(accounts.find_account("alice", TOKEN).await?.map(|a| a.amount), Some(0));
        assert_eq!(accounts.find_account("bob", TOKEN).await?.map(|a| a.amount), Some(0));
        let records = TransferStore::new(client).get_transfers_by_tx_hash("tx-1").await?;
        assert_eq!(records[0].amount, 0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_workers_do_not_lose_updates() -> Result<()> {
        // A file database so every worker gets its own connection
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let client = Client::init(&url).await?;
        assert!(client.pool().options().get_max_connections() > 1);

        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());
        let failures = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let config = PoolConfig { workers: 5, capacity: 10, overflow: OverflowPolicy::Block };
        let pool = {
            let failures = Arc::clone(&failures);
            WorkerPool::spawn(&config, shutdown_tx, move |unit: BlockWithTransactions| {
                let processor = processor.clone();
                let failures = Arc::clone(&failures);
                async move {
                    let outcome = processor.process_block_with_transactions(&unit).await;
                    if outcome.is_err() {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                    outcome.map(|_| ())
                }
            })
        };

        for height in 1..=100 {
            pool.submit(mint(height, "alice", "1")).await?;
        }
        pool.close().await;

        assert_eq!(failures.load(Ordering::SeqCst), 0);
        let alice = AccountStore::new(client.clone()).find_account("alice", TOKEN).await?;
        assert_eq!(alice.map(|account| account.amount), Some(100));
        assert_eq!(BlockStore::new(client).count_blocks_between(1, 100).await?, 100);

        Ok(())
    }

    // ---------------------------
    // PIPELINE
    // ---------------------------

    #[tokio::test]
    async fn test_engine_applies_published_units() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let broker: Arc<dyn MessageBroker> =
            Arc::new(TopicBroker::new(MemoryQueue::new(), fast_config()));
        let sink = Arc::new(LedgerSink {
            processor: LedgerProcessor::new(client.clone(), LedgerConfig::default()),
        });

        let args = Args {
            pool: PoolConfig { overflow: OverflowPolicy::Block, ..Default::default() },
            ..Default::default()
        };
        let engine = Engine::start(&args, Arc::clone(&broker), sink).await?;
        assert_eq!(engine.subscription().topic, BLOCK_WITH_TXS_TOPIC);

        let units = vec![mint(1, "alice", "100"), mint(2, "alice", "20"), mint(1, "alice", "100")];
        publisher::publish_units(broker.as_ref(), BLOCK_WITH_TXS_TOPIC, &units).await?;
        // Garbage on the topic is acknowledged and skipped
        broker.publish(BLOCK_WITH_TXS_TOPIC, b"not a unit").await?;

        let accounts = AccountStore::new(client.clone());
        assert!(eventually(|| balance_is(&accounts, "alice", 120)).await);

        engine.shutdown().await;
        assert_eq!(BlockStore::new(client).get_latest_height().await?, Some(2));

        Ok(())
    }

    struct GatedSink {
        gate: Arc<Semaphore>,
        seen: Arc<Mutex<Vec<Height>>>,
    }

    #[async_trait::async_trait]
    impl Sink for GatedSink {
        type Item = BlockWithTransactions;

        async fn process(&self, unit: &BlockWithTransactions) -> Result<()> {
            let _permit = self.gate.acquire().await?;
            self.seen.lock().await.push(unit.height());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_full_pool_still_acknowledges_messages() -> Result<()> {
        let broker = Arc::new(TopicBroker::new(MemoryQueue::new(), fast_config()));
        let gate = Arc::new(Semaphore::new(0));
        let seen: Arc<Mutex<Vec<Height>>> = Arc::default();
        let sink = Arc::new(GatedSink { gate: Arc::clone(&gate), seen: Arc::clone(&seen) });

        let args = Args {
            subscription: Some("ledger".to_string()),
            pool: PoolConfig { workers: 1, capacity: 1, overflow: OverflowPolicy::Drop },
            ..Default::default()
        };
        let engine = Engine::start(&args, broker.clone(), sink).await?;

        let units: Vec<_> = (1..=6).map(|height| mint(height, "alice", "1")).collect();
        publisher::publish_units(broker.as_ref(), BLOCK_WITH_TXS_TOPIC, &units).await?;

        let substrate = Arc::clone(broker.substrate());
        let drained = eventually(|| {
            let substrate = Arc::clone(&substrate);
            async move { substrate.depth("ledger").await.ok() == Some(0) }
        })
        .await;
        assert!(drained);

        gate.add_permits(units.len());
        engine.shutdown().await;

        // One unit in the worker plus one buffered; the rest were dropped
        let seen = seen.lock().await;
        assert!(!seen.is_empty() && seen.len() < units.len());

        Ok(())
    }

    struct VecSource {
        units: Vec<BlockWithTransactions>,
    }

    #[async_trait::async_trait]
    impl BlockSource for VecSource {
        async fn latest_height(&self) -> Result<Option<Height>> {
            Ok(self.units.iter().map(BlockWithTransactions::height).max())
        }

        async fn fetch_range(&self, from: Height, to: Height) -> Result<Vec<BlockWithTransactions>> {
            Ok(self.units.iter().filter(|unit| (from..to).contains(&unit.height())).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_synchronizer_publishes_missing_units() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        insert_heights(&client, &[1, 2, 4]).await?;

        let broker = Arc::new(TopicBroker::new(MemoryQueue::new(), fast_config()));
        let seen: Arc<Mutex<Vec<Height>>> = Arc::default();
        let recorder = {
            let seen = Arc::clone(&seen);
            handler(move |payload| {
                let seen = Arc::clone(&seen);
                async move {
                    let unit = BlockWithTransactions::from_bytes(&payload)?;
                    seen.lock().await.push(unit.height());
                    Ok(())
                }
            })
        };
        broker.subscribe(BLOCK_WITH_TXS_TOPIC, recorder).await?;

        let source = Arc::new(VecSource { units: (1..=5).map(|h| mint(h, "alice", "1")).collect() });
        let checkpointer = Checkpointer::new(client.clone());
        let synchronizer = Synchronizer::new(
            BlockStore::new(client.clone()),
            gapfiller(&client, 2),
            checkpointer.clone(),
            source,
            broker.clone(),
            SynchronizerConfig { fetch_chunk: 2, ..Default::default() },
        );

        let reconciled = synchronizer.reconcile(None).await?;
        assert_eq!((reconciled.floor, reconciled.ceiling, reconciled.gap), (1, 6, 3));
        assert_eq!(reconciled.published, 2);

        let checkpoint = checkpointer.get_last_checkpoint().await?;
        assert_eq!(checkpoint.map(|c| c.to_string()), Some("[1, 6) at 3".to_string()));

        let delivered = eventually(|| {
            let seen = Arc::clone(&seen);
            async move { seen.lock().await.len() == 2 }
        })
        .await;
        assert!(delivered);
        let mut heights = seen.lock().await.clone();
        heights.sort_unstable();
        assert_eq!(heights, vec![3, 5]);

        broker.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_moves_past_rejected_block() -> Result<()> {
        let client = Client::init("sqlite::memory:").await?;
        let processor = LedgerProcessor::new(client.clone(), LedgerConfig::default());

        let units = vec![mint(1, "alice", "1"), mint(2, "alice", "abc"), mint(3, "alice", "1")];
        for unit in &units {
            let _ = processor.process_block_with_transactions(unit).await;
        }

        let broker = Arc::new(TopicBroker::new(MemoryQueue::new(), fast_config()));
        let checkpointer = Checkpointer::new(client.clone());
        let synchronizer = Synchronizer::new(
            BlockStore::new(client.clone()),
            gapfiller(&client, 1000),
            checkpointer.clone(),
            Arc::new(VecSource { units }),
            broker.clone(),
            SynchronizerConfig::default(),
        );

        for _ in 0..2 {
            let reconciled = synchronizer.reconcile(None).await?;
            assert_eq!((reconciled.gap, reconciled.ceiling, reconciled.published), (4, 4, 0));
        }
        let checkpoint = checkpointer.get_last_checkpoint().await?;
        assert_eq!(checkpoint.map(|c| c.being_block), Some(4));

        let alice = AccountStore::new(client).find_account("alice", TOKEN).await?;
        assert_eq!(alice.map(|account| account.amount), Some(2));

        Ok(())
    }

    struct SlowSink {
        seen: Arc<Mutex<Vec<Height>>>,
    }

    #[async_trait::async_trait]
    impl Sink for SlowSink {
        type Item = BlockWithTransactions;

        async fn process(&self, unit: &BlockWithTransactions) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.seen.lock().await.push(unit.height());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_buffered_units() -> Result<()> {
        let broker = Arc::new(TopicBroker::new(MemoryQueue::new(), fast_config()));
        let seen: Arc<Mutex<Vec<Height>>> = Arc::default();
        let sink = Arc::new(SlowSink { seen: Arc::clone(&seen) });

        let args = Args {
            subscription: Some("ledger".to_string()),
            pool: PoolConfig { workers: 1, capacity: 10, overflow: OverflowPolicy::Block },
            ..Default::default()
        };
        let engine = Engine::start(&args, broker.clone(), sink).await?;

        let units: Vec<_> = (1..=5).map(|height| mint(height, "alice", "1")).collect();
        publisher::publish_units(broker.as_ref(), BLOCK_WITH_TXS_TOPIC, &units).await?;

        // Every message handed to the pool is acknowledged
        let substrate = Arc::clone(broker.substrate());
        let handed_over = eventually(|| {
            let substrate = Arc::clone(&substrate);
            async move { substrate.depth("ledger").await.ok() == Some(0) }
        })
        .await;
        assert!(handed_over);

        engine.shutdown().await;

        let mut seen = seen.lock().await.clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);

        Ok(())
    }
}
