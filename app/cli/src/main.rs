mod cli {
    pub mod engine {
        pub mod args;
        pub mod run;
    }
    pub mod query {
        pub mod args;
        pub mod read;
        pub mod response;
        pub mod run;
    }
    pub mod sync {
        pub mod args;
        pub mod run;
    }
    pub mod bus;
    pub mod cmd;
    pub mod signal;
}

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::cmd::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli);

    match &cli.command {
        Command::Process(args) => {
            tracing::info!("Process Command: {:?}", args);
            cli::engine::run::start(args).await
        }
        Command::Sync(args) => {
            tracing::info!("Sync Command: {:?}", args);
            cli::sync::run::reconcile(args).await
        }
        Command::Gap(query) => {
            tracing::info!("Gap Query: {:?}", query);
            cli::query::run::gap(query).await
        }
        Command::Select(query) => {
            tracing::info!("Select Query: {:?}", query);
            cli::query::run::select(query).await
        }
    }
}

fn init_tracing(cli: &Cli) {
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &cli.command {
        Command::Process(_) | Command::Sync(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        // stdout is reserved for JSON output
        Command::Gap(_) | Command::Select(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}
