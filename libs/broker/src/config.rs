use std::time::Duration;

#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Longest a single receive call waits for a message.
    pub wait_time: Duration,
    /// How long a received message stays hidden before it is redelivered.
    pub visibility_timeout: Duration,
    /// Messages taken per receive call.
    pub max_messages: usize,
    /// How long `close` waits for pollers before abandoning them.
    pub close_timeout: Duration,
    /// Pause after a failed receive call.
    pub receive_error_backoff: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(20),
            visibility_timeout: Duration::from_secs(30),
            max_messages: 10,
            close_timeout: Duration::from_secs(30),
            receive_error_backoff: Duration::from_secs(1),
        }
    }
}
