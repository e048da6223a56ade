use crate::constants::*;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File locations and tuning for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub input_extension: String,
    pub raw_artifact: PathBuf,
    pub clean_artifact: PathBuf,
    pub connect_timeout_secs: u64,
    pub log_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let staging = std::env::temp_dir();
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            raw_artifact: staging.join(RAW_ARTIFACT_FILE),
            clean_artifact: staging.join(CLEAN_ARTIFACT_FILE),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl PipelineConfig {
    /// Reads `path` if given (it must exist), otherwise `etl.toml` when present,
    /// otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| EtlError::configuration(format!("Invalid pipeline config: {e}")))?;
        if config.input_extension.is_empty() {
            return Err(EtlError::configuration("input_extension must not be empty"));
        }
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Connection parameters for the destination store.
///
/// All five values are required and non-empty; construction fails otherwise, so a
/// loader holding one of these never has to re-check.
#[derive(Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl DestinationConfig {
    pub fn new(
        host: impl Into<String>,
        port: &str,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self> {
        let host = required(ENV_MYSQL_HOST, host.into())?;
        let port = required(ENV_MYSQL_PORT, port.to_string())?;
        let user = required(ENV_MYSQL_USER, user.into())?;
        let password = required(ENV_MYSQL_PASSWORD, password.into())?;
        let database = required(ENV_MYSQL_DATABASE, database.into())?;

        let port = port.trim().parse::<u16>().map_err(|_| {
            EtlError::configuration(format!("{ENV_MYSQL_PORT} is not a valid port: '{port}'"))
        })?;

        Ok(Self {
            host,
            port,
            user,
            password,
            database,
        })
    }

    /// Builds the config from the process environment (`MYSQL_HOST`, `MYSQL_PORT`,
    /// `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Self::new(
            var(ENV_MYSQL_HOST),
            &var(ENV_MYSQL_PORT),
            var(ENV_MYSQL_USER),
            var(ENV_MYSQL_PASSWORD),
            var(ENV_MYSQL_DATABASE),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

// Unset and empty are treated alike.
fn required(name: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(EtlError::configuration(format!("{name} is missing or empty")));
    }
    Ok(value)
}
