use chain::model::{BlockWithTransactions, NATIVE_DENOM};
use chrono::Utc;
use sqlx::{Connection, SqliteConnection};
use store::account::store::Store as AccountStore;
use store::block::{model::Block, store::Store as BlockStore};
use store::client::Client;
use store::transaction::{model::Transaction, store::Store as TransactionStore};
use store::transfer::{model::Transfer, store::Store as TransferStore};
use store::utils;

use crate::ledger::error::LedgerError;
use crate::ledger::event::{Func, TransferEvent, transfer_events};

/// What happens to a debit that would take a balance below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Apply it; balances may go negative.
    #[default]
    Permissive,
    /// Fail the whole unit with [`LedgerError::NegativeBalance`].
    RejectNegative,
}

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Denomination recorded on every transfer audit record.
    pub denom: String,
    pub balance_policy: BalancePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { denom: NATIVE_DENOM.to_string(), balance_policy: BalancePolicy::default() }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Processed {
    Applied { transactions: usize, transfers: usize },
    Duplicate,
}

/// Replays block units into account balances and the transfer audit trail.
#[derive(Clone)]
pub struct LedgerProcessor {
    client: Client,
    blocks: BlockStore,
    transactions: TransactionStore,
    accounts: AccountStore,
    transfers: TransferStore,
    config: LedgerConfig,
}

impl LedgerProcessor {
    pub fn new(client: Client, config: LedgerConfig) -> Self {
        Self {
            blocks: BlockStore::new(client.clone()),
            transactions: TransactionStore::new(client.clone()),
            accounts: AccountStore::new(client.clone()),
            transfers: TransferStore::new(client.clone()),
            client,
            config,
        }
    }

    /// Applies one unit. The block insert decides whether the unit is new: a
    /// height that is already stored makes the whole call a no-op.
    ///
    /// Bad transfer events roll back only the balance and audit writes. The
    /// block and transaction rows still commit, so the height counts as
    /// indexed and the error is returned. Database errors roll back the whole
    /// unit for redelivery.
    pub async fn process_block_with_transactions(
        &self,
        unit: &BlockWithTransactions,
    ) -> Result<Processed, LedgerError> {
        let height = unit.height();
        let block = Block::try_from(&unit.block)
            .map_err(|source| LedgerError::Encode { record: format!("block {height}"), source })?;
        let rows = unit
            .transactions
            .iter()
            .map(|transaction| {
                Transaction::try_from(transaction).map_err(|source| LedgerError::Encode {
                    record: format!("tx {}", transaction.hash),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.client.pool().begin().await?;

        match self.blocks.insert_block(&mut tx, &block).await {
            Ok(()) => {}
            Err(e) if utils::is_unique_violation(&e) => {
                tracing::info!(height, "Duplicate block ignored");
                return Ok(Processed::Duplicate);
            }
            Err(e) => {
                tracing::error!(height, "Ledger failed on [insert_block]: {e:?}");
                return Err(e.into());
            }
        }
        self.transactions.insert_transactions(&mut tx, &rows).await?;

        // Savepoint around the ledger effects
        let mut ledger = Connection::begin(&mut *tx).await?;
        match self.apply_events(&mut ledger, unit).await {
            Ok(transfers) => {
                ledger.commit().await?;
                tx.commit().await?;
                Ok(Processed::Applied { transactions: rows.len(), transfers })
            }
            Err(e) if e.is_data_error() => {
                ledger.rollback().await?;
                tx.commit().await?;
                tracing::warn!(height, "Block stored without ledger effects: {e}");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Balance updates and audit records of every transfer event in `unit`.
    /// Returns the number of audit records written.
    async fn apply_events(
        &self,
        conn: &mut SqliteConnection,
        unit: &BlockWithTransactions,
    ) -> Result<usize, LedgerError> {
        let mut transfers = 0;
        for transaction in &unit.transactions {
            let events = transfer_events(transaction)?;
            let mut records = Vec::with_capacity(events.len());
            for event in &events {
                self.apply(conn, event).await?;
                records.push(self.audit_record(&transaction.hash, event));
            }
            self.transfers.insert_transfers(conn, &records).await?;
            transfers += records.len();
        }
        Ok(transfers)
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        event: &TransferEvent<'_>,
    ) -> Result<(), LedgerError> {
        let (token, amount) = (event.token, event.amount);
        match event.func {
            Func::Mint => match event.to {
                Some(to) => self.credit(conn, to, token, amount).await?,
                None => tracing::warn!(token, amount, "Mint without recipient, balance untouched"),
            },
            Func::Burn => match event.from {
                Some(from) => self.debit(conn, from, token, amount).await?,
                None => tracing::warn!(token, amount, "Burn without sender, balance untouched"),
            },
            Func::Transfer => {
                match event.from {
                    Some(from) => self.debit(conn, from, token, amount).await?,
                    None => tracing::warn!(token, amount, "Transfer without sender, debit skipped"),
                }
                match event.to {
                    Some(to) => self.credit(conn, to, token, amount).await?,
                    None => tracing::warn!(token, amount, "Transfer without recipient, credit skipped"),
                }
            }
            Func::Other => {
                tracing::warn!(func = %event.func_name, token, "Unknown transfer func skipped")
            }
        }
        Ok(())
    }

    async fn ensure_account(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
    ) -> Result<(), LedgerError> {
        if self.accounts.get_account(conn, address, token).await?.is_none() {
            self.accounts.insert_account(conn, address, token).await?;
        }
        Ok(())
    }

    async fn credit(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.ensure_account(conn, address, token).await?;
        self.accounts.increment_account_balance(conn, address, token, amount).await?;
        Ok(())
    }

    async fn debit(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.ensure_account(conn, address, token).await?;
        match self.config.balance_policy {
            BalancePolicy::Permissive => {
                self.accounts.increment_account_balance(conn, address, token, -amount).await?;
            }
            BalancePolicy::RejectNegative => {
                let applied = self
                    .accounts
                    .increment_account_balance_non_negative(conn, address, token, -amount)
                    .await?;
                if !applied {
                    return Err(LedgerError::NegativeBalance {
                        address: address.to_string(),
                        token: token.to_string(),
                        amount,
                    });
                }
            }
        }
        Ok(())
    }

    fn audit_record(&self, tx_hash: &str, event: &TransferEvent<'_>) -> Transfer {
        Transfer {
            tx_hash: tx_hash.to_string(),
            func: event.func_name.clone(),
            from_address: event.from.map(str::to_string),
            to_address: event.to.map(str::to_string),
            token: event.token.to_string(),
            amount: event.amount,
            denom: self.config.denom.clone(),
            created_at: Utc::now(),
        }
    }
}
