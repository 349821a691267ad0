use clap::{Parser, ValueEnum};
use engine::ledger::processor::BalancePolicy;
use sync::pool::OverflowPolicy;

#[derive(Parser, Debug)]
#[command(about = "Run the ledger pipeline", long_about = None)]
pub struct Args {
    /// SQLite connection string of the ledger store
    #[arg(short, long, env = "INDEXER_DB_URL")]
    pub db_url: String,

    /// SQLite connection string of the broker queues (defaults to the store)
    #[arg(short, long, env = "INDEXER_BROKER_URL")]
    pub broker_url: Option<String>,

    /// Topic carrying block units
    #[arg(short, long, default_value_t = chain::model::BLOCK_WITH_TXS_TOPIC.to_string())]
    pub topic: String,

    /// Durable queue name; a fresh queue is bound when omitted
    #[arg(short, long)]
    pub subscription: Option<String>,

    /// Number of ledger workers
    #[arg(short, long, default_value_t = 5)]
    pub workers: usize,

    /// Buffered units between the broker and the workers
    #[arg(long, default_value_t = 100)]
    pub capacity: usize,

    /// What to do with a unit that arrives while the buffer is full
    #[arg(long, value_enum, default_value_t = CliOverflow::Drop)]
    pub overflow: CliOverflow,

    /// What to do with a debit that would leave a negative balance
    #[arg(long, value_enum, default_value_t = CliBalancePolicy::Permissive)]
    pub balance_policy: CliBalancePolicy,

    /// Denomination written on transfer records
    #[arg(long, default_value_t = chain::model::NATIVE_DENOM.to_string())]
    pub denom: String,

    /// Long-poll wait per receive, in seconds
    #[arg(long, default_value_t = 20)]
    pub wait_time: u64,

    /// Seconds a received message stays hidden before redelivery
    #[arg(long, default_value_t = 30)]
    pub visibility_timeout: u64,

    /// Seconds shutdown waits for workers to drain buffered units
    #[arg(long, default_value_t = 30)]
    pub drain_timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliOverflow {
    Drop,
    Block,
    Redeliver,
}

impl From<CliOverflow> for OverflowPolicy {
    fn from(value: CliOverflow) -> Self {
        match value {
            CliOverflow::Drop => OverflowPolicy::Drop,
            CliOverflow::Block => OverflowPolicy::Block,
            CliOverflow::Redeliver => OverflowPolicy::Redeliver,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliBalancePolicy {
    Permissive,
    RejectNegative,
}

impl From<CliBalancePolicy> for BalancePolicy {
    fn from(value: CliBalancePolicy) -> Self {
        match value {
            CliBalancePolicy::Permissive => BalancePolicy::Permissive,
            CliBalancePolicy::RejectNegative => BalancePolicy::RejectNegative,
        }
    }
}
