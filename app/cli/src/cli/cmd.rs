use clap::{Parser, Subcommand};

use crate::cli::query::args::{GapQuery, Query};

use super::engine::args::Args;
use super::sync::args::SyncArgs;

#[derive(Parser, Debug)]
#[command(name = "gno-indexer")]
#[command(about = "CLI tool for the gno.land token ledger indexer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply published block units to the ledger until interrupted
    Process(Args),
    /// Publish the units the store is missing, read from an NDJSON file
    Sync(SyncArgs),
    /// Print the first missing block height
    Gap(GapQuery),
    Select(Query),
}
