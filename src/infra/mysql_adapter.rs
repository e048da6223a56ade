use crate::app::ports::{DestinationConnector, DestinationTransaction};
use crate::config::DestinationConfig;
use crate::constants::{DESTINATION_COLUMNS, DESTINATION_TABLE};
use crate::types::{CellValue, TrainingRecord};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, MySqlPool, Transaction};
use std::time::Duration;
use tracing::info;

/// MySQL destination. Each `connect` opens a fresh single-connection pool that
/// lives only as long as the returned transaction.
pub struct MySqlConnector {
    connect_timeout: Duration,
    insert_sql: String,
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            insert_sql: insert_statement(),
        }
    }

    fn connect_options(config: &DestinationConfig) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(config.host())
            .port(config.port())
            .username(config.user())
            .password(config.password())
            .database(config.database())
            .charset("utf8mb4")
    }
}

#[async_trait]
impl DestinationConnector for MySqlConnector {
    async fn connect(
        &self,
        config: &DestinationConfig,
    ) -> anyhow::Result<Box<dyn DestinationTransaction>> {
        info!(
            "Connecting to MySQL at {}:{}/{}",
            config.host(),
            config.port(),
            config.database()
        );
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect_with(Self::connect_options(config))
            .await
            .with_context(|| format!("failed to connect to {}:{}", config.host(), config.port()))?;

        let tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                pool.close().await;
                return Err(anyhow!(e).context("failed to start transaction"));
            }
        };

        Ok(Box::new(MySqlTransaction {
            pool,
            tx: Some(tx),
            insert_sql: self.insert_sql.clone(),
        }))
    }
}

struct MySqlTransaction {
    pool: MySqlPool,
    tx: Option<Transaction<'static, MySql>>,
    insert_sql: String,
}

// Commit and rollback both consume the transaction; anything after that is a caller bug.
fn take_open<T>(slot: &mut Option<T>) -> anyhow::Result<T> {
    slot.take().ok_or_else(|| anyhow!("transaction already finished"))
}

#[async_trait]
impl DestinationTransaction for MySqlTransaction {
    async fn insert(&mut self, record: &TrainingRecord) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| anyhow!("transaction already finished"))?;
        let mut query = sqlx::query(&self.insert_sql);
        for value in record.values() {
            query = match value {
                CellValue::Null => query.bind(None::<String>),
                CellValue::Int(i) => query.bind(*i),
                CellValue::Float(f) => query.bind(*f),
                CellValue::Text(s) => query.bind(s.clone()),
            };
        }
        query.execute(&mut **tx).await?;
        Ok(())
    }

    async fn commit(&mut self) -> anyhow::Result<()> {
        let tx = take_open(&mut self.tx)?;
        let result = tx.commit().await.map_err(anyhow::Error::from);
        self.pool.close().await;
        result
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        let tx = take_open(&mut self.tx)?;
        let result = tx.rollback().await.map_err(anyhow::Error::from);
        self.pool.close().await;
        result
    }
}

fn insert_statement() -> String {
    let placeholders = vec!["?"; DESTINATION_COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        DESTINATION_TABLE,
        DESTINATION_COLUMNS.join(", "),
        placeholders
    )
}
