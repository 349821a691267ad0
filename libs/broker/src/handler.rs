use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

/// Called once per delivered message. `Ok` acknowledges the message,
/// `Err` leaves it on the queue for redelivery.
pub type Handler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, eyre::Result<()>> + Send + Sync>;

pub fn handler<F, Fut>(handler_factory: F) -> Handler
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = eyre::Result<()>> + Send + 'static,
{
    Arc::new(move |payload: Vec<u8>| Box::pin(handler_factory(payload)))
}
