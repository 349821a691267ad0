use std::str::FromStr;

use clap::ValueEnum;

#[derive(Debug, Clone, ValueEnum)]
pub enum Entity {
    Accounts,
    Transfers,
    Blocks,
    Checkpoint,
}

#[derive(Debug, Clone)]
pub enum Height {
    Number(u64),
    Last,
}

impl FromStr for Height {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("last") {
            Ok(Height::Last)
        } else {
            s.parse::<u64>()
                .map(Height::Number)
                .map_err(|_| format!("`{s}` is not a valid block height or `last`"))
        }
    }
}
