//! Server configuration, resolved once at startup from `HBNB_*` variables

use ::config::{Config, Environment};
use hbnb_core::{HbnbError, Result};
use serde::{Deserialize, Deserializer};

/// Which storage engine backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    File,
    Db,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnv {
    /// Wipes the relational schema on connect
    Test,
    Dev,
}

impl From<&str> for RunEnv {
    /// Only `test` is special; any other name runs as `Dev`
    fn from(name: &str) -> Self {
        if name == "test" {
            RunEnv::Test
        } else {
            RunEnv::Dev
        }
    }
}

fn run_env<'de, D>(deserializer: D) -> std::result::Result<RunEnv, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(RunEnv::from(name.as_str()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_host: String,
    pub api_port: u16,
    pub type_storage: StorageMode,
    pub file_path: String,
    pub db_path: String,
    #[serde(deserialize_with = "run_env")]
    pub env: RunEnv,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix("HBNB"))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("api_host", "0.0.0.0")
            .and_then(|b| b.set_default("api_port", 5000))
            .and_then(|b| b.set_default("type_storage", "file"))
            .and_then(|b| b.set_default("file_path", "file.json"))
            .and_then(|b| b.set_default("db_path", "hbnb.db"))
            .and_then(|b| b.set_default("env", "dev"))
            .map_err(|e| HbnbError::Config(e.to_string()))?
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| HbnbError::Config(e.to_string()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
