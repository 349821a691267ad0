pub mod args;
pub mod checkpointer;
pub mod engine;
pub mod gapfiller;
pub mod synchronizer;
pub mod ledger {
    pub mod error;
    pub mod event;
    pub mod processor;
}
pub mod pubsub {
    pub mod publisher;
    pub mod subscriber;
}
pub mod sink {
    pub mod handle;
    pub mod ledger;
}
