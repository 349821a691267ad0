use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Publish missing block units", long_about = None)]
pub struct SyncArgs {
    /// SQLite connection string of the ledger store
    #[arg(short, long, env = "INDEXER_DB_URL")]
    pub db_url: String,

    /// SQLite connection string of the broker queues (defaults to the store)
    #[arg(short, long, env = "INDEXER_BROKER_URL")]
    pub broker_url: Option<String>,

    /// NDJSON file with one block unit per line
    #[arg(short, long)]
    pub file: PathBuf,

    /// Exclusive upper height; defaults to one past the file's last unit
    #[arg(short, long)]
    pub ceiling: Option<u64>,

    #[arg(short, long, default_value_t = chain::model::BLOCK_WITH_TXS_TOPIC.to_string())]
    pub topic: String,

    /// Lowest height expected in the store
    #[arg(long, default_value_t = 1)]
    pub floor: u64,

    /// Heights counted per gap-scan query
    #[arg(long, default_value_t = 1000)]
    pub batch_size: u64,

    /// Heights fetched from the file per chunk
    #[arg(long, default_value_t = 500)]
    pub fetch_chunk: u64,
}
