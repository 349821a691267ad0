use eyre::Result;

/// Where decoded units end up once a worker pulls them.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    type Item;

    async fn process(&self, element: &Self::Item) -> Result<()>;
}
