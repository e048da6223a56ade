use crate::config::DestinationConfig;
use crate::types::TrainingRecord;
use async_trait::async_trait;

/// Opens a transactional session against the destination store.
#[async_trait]
pub trait DestinationConnector: Send + Sync {
    async fn connect(
        &self,
        config: &DestinationConfig,
    ) -> anyhow::Result<Box<dyn DestinationTransaction>>;
}

/// One open connection with a transaction in progress.
///
/// Inserts are invisible to other readers until `commit`. After `commit` or
/// `rollback` the connection is closed and the session must not be reused.
#[async_trait]
pub trait DestinationTransaction: Send {
    async fn insert(&mut self, record: &TrainingRecord) -> anyhow::Result<()>;

    async fn commit(&mut self) -> anyhow::Result<()>;

    async fn rollback(&mut self) -> anyhow::Result<()>;
}
