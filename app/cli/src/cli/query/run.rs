use engine::checkpointer::Checkpointer;
use engine::gapfiller::{Gapfiller, GapfillerConfig};
use eyre::{Result, eyre};
use serde::Serialize;
use store::client::Client;

use crate::cli::query::args::{GapQuery, Query};
use crate::cli::query::read::{Entity, Height};
use crate::cli::query::response::{
    AccountResponse, BlockResponse, CheckpointResponse, GapResponse, TransferResponse,
};

pub async fn select(query: &Query) -> Result<()> {
    let client = Client::init(&query.db_url).await?;

    match query.entity {
        Entity::Accounts => {
            let account_store = store::account::store::Store::new(client.clone());

            let accounts = match &query.address {
                Some(address) => account_store.get_accounts_by_address(address).await?,
                None => account_store.get_accounts().await?,
            };

            if accounts.is_empty() {
                println!("No Accounts Found")
            } else {
                let response: Vec<AccountResponse> =
                    accounts.into_iter().map(AccountResponse).collect();
                print_json(&response)?;
            }
        }
        Entity::Transfers => {
            let transfer_store = store::transfer::store::Store::new(client.clone());

            let address =
                query.address.as_deref().ok_or(eyre!("--address is required for transfers"))?;

            let transfers = transfer_store.get_transfers_by_address(address).await?;

            if transfers.is_empty() {
                println!("No Transfers Found")
            } else {
                let response: Vec<TransferResponse> =
                    transfers.into_iter().map(TransferResponse).collect();
                print_json(&response)?;
            }
        }
        Entity::Blocks => {
            let block_store = store::block::store::Store::new(client.clone());

            let latest = block_store.get_latest_height().await?;
            let resolve = |height: &Height| match height {
                Height::Number(number) => Ok(*number),
                Height::Last => latest.ok_or(eyre!("No Blocks Found")),
            };
            let from = resolve(&query.from_block)?;
            let to = resolve(&query.to_block)?;

            let blocks = block_store.get_blocks_between(from, to).await?;

            if blocks.is_empty() {
                println!("No Blocks Found")
            } else {
                let response: Vec<BlockResponse> = blocks.into_iter().map(BlockResponse).collect();
                print_json(&response)?;
            }
        }
        Entity::Checkpoint => {
            let checkpoint = Checkpointer::new(client.clone())
                .get_last_checkpoint()
                .await?
                .ok_or(eyre!("Checkpoint Not Found"))?;

            print_json(&CheckpointResponse(checkpoint))?;
        }
    }

    Ok(())
}

pub async fn gap(query: &GapQuery) -> Result<()> {
    let client = Client::init(&query.db_url).await?;
    let block_store = store::block::store::Store::new(client.clone());

    let gapfiller = Gapfiller::new(
        block_store.clone(),
        Checkpointer::new(client),
        GapfillerConfig { batch_size: query.batch_size, floor: query.floor },
    );

    let floor = gapfiller.floor().await?;
    let ceiling = match query.ceiling {
        Height::Number(ceiling) => ceiling,
        Height::Last => block_store.get_latest_height().await?.map_or(floor, |latest| latest + 1),
    };
    let gap = gapfiller.find_first_gap_from(floor, ceiling).await?;

    print_json(&GapResponse { floor, ceiling, gap })
}

fn print_json<T: Serialize>(response: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
