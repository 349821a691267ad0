pub mod broker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod poller;
pub mod substrate {
    pub mod handle;
    pub mod memory;
    pub mod sqlite;
}
