use chain::model::BlockWithTransactions;
use eyre::{Result, eyre};

use crate::ledger::processor::{LedgerProcessor, Processed};
use crate::sink::handle::Sink;

pub struct LedgerSink {
    pub processor: LedgerProcessor,
}

#[async_trait::async_trait]
impl Sink for LedgerSink {
    type Item = BlockWithTransactions;

    async fn process(&self, unit: &BlockWithTransactions) -> Result<()> {
        let height = unit.height();
        match self.processor.process_block_with_transactions(unit).await {
            Ok(Processed::Applied { transactions, transfers }) => {
                tracing::info!(height, transactions, transfers, "Processed block");
                Ok(())
            }
            Ok(Processed::Duplicate) => Ok(()),
            Err(e) if e.is_data_error() => {
                tracing::error!(height, "Rejected block: {e}");
                Err(eyre!(e))
            }
            Err(e) => {
                tracing::error!(height, "Ledger failed on [process_block_with_transactions]: {e:?}");
                Err(eyre!(e))
            }
        }
    }
}
