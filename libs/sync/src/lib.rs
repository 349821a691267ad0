pub mod consumer;
pub mod pool;
