use broker::broker::MessageBroker;
use chain::model::BlockWithTransactions;
use eyre::Result;

/// Publishes each unit as JSON on `topic`, stopping at the first failure.
pub async fn publish_units(
    broker: &dyn MessageBroker,
    topic: &str,
    units: &[BlockWithTransactions],
) -> Result<usize> {
    for unit in units {
        let payload = unit.to_bytes()?;
        if let Err(e) = broker.publish(topic, &payload).await {
            tracing::error!(height = unit.height(), "Publisher failed on [publish]: {e}");
            return Err(e.into());
        }
        tracing::debug!(height = unit.height(), topic, "Published unit");
    }
    Ok(units.len())
}
