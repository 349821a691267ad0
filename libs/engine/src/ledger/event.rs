use chain::model::{Event, Transaction};

use crate::ledger::error::LedgerError;

const TRANSFER_EVENT_TYPE: &str = "transfer";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Mint,
    Burn,
    Transfer,
    Other,
}

impl Func {
    fn parse(func: &str) -> Self {
        match func {
            "mint" => Func::Mint,
            "burn" => Func::Burn,
            "transfer" => Func::Transfer,
            _ => Func::Other,
        }
    }
}

/// A transfer-class event with its attributes pulled out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferEvent<'a> {
    /// Lowercased `func` as it appeared on the event.
    pub func_name: String,
    pub func: Func,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub token: &'a str,
    pub amount: i64,
}

/// Transfer-class events of `tx`, in the order they were emitted.
pub fn transfer_events(tx: &Transaction) -> Result<Vec<TransferEvent<'_>>, LedgerError> {
    tx.response
        .events
        .iter()
        .filter(|event| event.kind.eq_ignore_ascii_case(TRANSFER_EVENT_TYPE))
        .map(|event| parse_transfer_event(&tx.hash, event))
        .collect()
}

fn parse_transfer_event<'a>(
    tx_hash: &str,
    event: &'a Event,
) -> Result<TransferEvent<'a>, LedgerError> {
    // An event without `value` moves nothing but is still recorded
    let amount: i64 = match event.attr("value") {
        Some(value) => value.parse().map_err(|source| LedgerError::InvalidValue {
            tx_hash: tx_hash.to_string(),
            value: value.to_string(),
            source,
        })?,
        None => 0,
    };
    if amount < 0 {
        return Err(LedgerError::NegativeValue { tx_hash: tx_hash.to_string(), value: amount });
    }

    let func_name = event.func.to_lowercase();
    Ok(TransferEvent {
        func: Func::parse(&func_name),
        func_name,
        from: non_empty(event.attr("from")),
        to: non_empty(event.attr("to")),
        token: &event.pkg_path,
        amount,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
