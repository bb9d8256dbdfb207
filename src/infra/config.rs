use std::str::FromStr;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

use crate::use_cases::ledger::DEFAULT_LOOKBACK_MONTHS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

pub struct AppConfig {
    pub database_url: SecretString,
    pub database_max_connections: u32,
    /// Seconds between two scheduled rebuild sweeps over all apps.
    pub rebuild_interval_secs: u64,
    /// Upper bound on app rebuilds running at the same time.
    pub max_concurrent_rebuilds: usize,
    /// Trailing window of transactions a rebuild reads, in calendar months.
    pub lookback_months: u32,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url: SecretString =
            SecretString::new(get_env::<String>("DATABASE_URL").into());
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let rebuild_interval_secs: u64 = get_env_default("REBUILD_INTERVAL_SECS", 3600);
        let max_concurrent_rebuilds: usize = get_env_default("MAX_CONCURRENT_REBUILDS", 4);
        let lookback_months: u32 = get_env_default("LOOKBACK_MONTHS", DEFAULT_LOOKBACK_MONTHS);
        let log_format: LogFormat = get_env_default("LOG_FORMAT", String::from("pretty"))
            .parse()
            .unwrap_or(LogFormat::Pretty);

        Self {
            database_url,
            database_max_connections,
            rebuild_interval_secs: rebuild_interval_secs.max(1),
            max_concurrent_rebuilds: max_concurrent_rebuilds.max(1),
            lookback_months,
            log_format,
        }
    }
}
