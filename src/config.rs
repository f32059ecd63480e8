use std::env;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::{Error, Result};

/// `HBASE_*` variables. Values stay strings until deserialization, so
/// credentials such as `000123` keep their leading zeros.
fn environment() -> Environment {
    Environment::with_prefix("HBASE")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub endpoint: String,
    pub access_key_id: String,
    pub access_signature: String,
    pub namespace: String,
    pub table: String,
    pub input_file: String,
    pub page_size: i32,
    pub request_timeout_ms: u64,
    pub seed: bool,
    pub create_table: bool,
    pub scan: bool,
    pub rust_log: String,
}

impl Settings {
    /// Reads `config/default`, `config/{RUN_MODE}` and `config/local` when
    /// present, then `HBASE_*` environment variables.
    pub fn new() -> Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment());

        Self::load(builder)
    }

    /// Fills in defaults, deserializes and validates whatever `builder` holds.
    pub fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let s = builder
            .set_default("namespace", "default")?
            .set_default("table", "sha256")?
            .set_default("input_file", "./case-1.txt")?
            .set_default("page_size", 10)?
            .set_default("request_timeout_ms", 5000)?
            .set_default("seed", true)?
            .set_default("create_table", false)?
            .set_default("scan", false)?
            .set_default("rust_log", "info")?
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("endpoint", &self.endpoint),
            ("access_key_id", &self.access_key_id),
            ("access_signature", &self.access_signature),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must be set", name)));
            }
        }
        if self.page_size <= 0 {
            return Err(Error::InvalidConfig("page_size must be positive".into()));
        }
        Ok(())
    }
}
