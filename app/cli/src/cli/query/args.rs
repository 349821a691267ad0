use clap::Parser;

use crate::cli::query::read::{Entity, Height};

#[derive(Parser, Debug)]
#[command(about = "Select indexed results", long_about = None)]
pub struct Query {
    /// SQLite connection string
    #[arg(short, long, env = "INDEXER_DB_URL")]
    pub db_url: String,

    /// Entity to query
    #[arg(short, long, value_enum)]
    pub entity: Entity,

    /// Account address (accounts, transfers)
    #[arg(short, long)]
    pub address: Option<String>,

    /// First block height (blocks)
    #[arg(long, default_value = "1")]
    pub from_block: Height,

    /// Last block height (blocks)
    #[arg(long, default_value = "last")]
    pub to_block: Height,
}

#[derive(Parser, Debug)]
#[command(about = "Locate the first missing block", long_about = None)]
pub struct GapQuery {
    /// SQLite connection string
    #[arg(short, long, env = "INDEXER_DB_URL")]
    pub db_url: String,

    /// Exclusive upper height; `last` means one past the highest stored block
    #[arg(short, long, default_value = "last")]
    pub ceiling: Height,

    /// Lowest height expected in the store
    #[arg(long, default_value_t = 1)]
    pub floor: u64,

    /// Heights counted per query
    #[arg(long, default_value_t = 1000)]
    pub batch_size: u64,
}
