use crate::app::ports::{DestinationConnector, DestinationTransaction};
use crate::config::DestinationConfig;
use crate::types::TrainingRecord;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory destination table for development/testing.
///
/// Inserts are buffered per session and only appended to the shared table on
/// commit, so it behaves like a transactional store. Failures can be injected to
/// exercise the loader's rollback path.
#[derive(Clone, Default)]
pub struct InMemoryDestination {
    committed: Arc<Mutex<Vec<TrainingRecord>>>,
    connection_attempts: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
    fail_insert_at: Option<usize>,
    refuse_connections: bool,
}

impl InMemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the insert with this zero-based index (per session) fail.
    pub fn fail_insert_at(mut self, index: usize) -> Self {
        self.fail_insert_at = Some(index);
        self
    }

    pub fn refuse_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    pub fn committed_rows(&self) -> Vec<TrainingRecord> {
        self.committed
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn connection_attempts(&self) -> usize {
        self.connection_attempts.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationConnector for InMemoryDestination {
    async fn connect(
        &self,
        config: &DestinationConfig,
    ) -> anyhow::Result<Box<dyn DestinationTransaction>> {
        self.connection_attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connections {
            bail!(
                "connection refused by {}:{}",
                config.host(),
                config.port()
            );
        }
        debug!("Opened in-memory session for {}", config.database());
        Ok(Box::new(InMemoryTransaction {
            committed: self.committed.clone(),
            rollbacks: self.rollbacks.clone(),
            pending: Vec::new(),
            inserts_attempted: 0,
            fail_insert_at: self.fail_insert_at,
            open: true,
        }))
    }
}

struct InMemoryTransaction {
    committed: Arc<Mutex<Vec<TrainingRecord>>>,
    rollbacks: Arc<AtomicUsize>,
    pending: Vec<TrainingRecord>,
    inserts_attempted: usize,
    fail_insert_at: Option<usize>,
    open: bool,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> anyhow::Result<()> {
        if !self.open {
            bail!("session already closed");
        }
        Ok(())
    }
}

#[async_trait]
impl DestinationTransaction for InMemoryTransaction {
    async fn insert(&mut self, record: &TrainingRecord) -> anyhow::Result<()> {
        self.ensure_open()?;
        let index = self.inserts_attempted;
        self.inserts_attempted += 1;
        if self.fail_insert_at == Some(index) {
            bail!("simulated insert failure at record {index}");
        }
        self.pending.push(record.clone());
        Ok(())
    }

    async fn commit(&mut self) -> anyhow::Result<()> {
        self.ensure_open()?;
        self.open = false;
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| anyhow!("destination table lock poisoned"))?;
        committed.append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.pending.clear();
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
