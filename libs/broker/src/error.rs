#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker is closed")]
    Closed,

    #[error("unknown queue `{0}`")]
    UnknownQueue(String),

    #[error("queue `{0}` is already subscribed on this broker")]
    DuplicateSubscription(String),

    #[error("substrate database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
