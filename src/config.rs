use std::{num::NonZeroUsize, time::Duration};

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::page::PagePolicy;

pub const DEFAULT_CONFIG_FILE: &str = "carnot.ron";
const ENV_PREFIX: &str = "CARNOT";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct CarnotConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub query: PagePolicy,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// sqlite file, or `:memory:`
    pub path: String,
    /// upper bound on any single store call
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config error `{0}`")]
    Load(#[from] config::ConfigError),
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("invalid query policy: {0}")]
    BadPagePolicy(&'static str),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "carnot.sqlite".to_string(),
            timeout_ms: 100_000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

impl IngestConfig {
    pub fn batch_size(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.batch_size).ok_or(ConfigError::ZeroBatchSize)
    }
}

impl CarnotConfig {
    /// Defaults, then the RON file (`carnot.ron` if present, or the given
    /// path which must exist), then `CARNOT__SECTION__KEY` env vars.
    pub fn load(file_path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match file_path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Self::build(Config::builder().add_source(file))
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(s, FileFormat::Ron)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        let cfg: Self = builder.add_source(env).build()?.try_deserialize()?;
        cfg.query.check().map_err(ConfigError::BadPagePolicy)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CarnotConfig::default();
        assert_eq!(cfg.server.bind, "0.0.0.0:3001");
        assert_eq!(cfg.store.path, "carnot.sqlite");
        assert_eq!(cfg.store.timeout(), Duration::from_secs(100));
        assert_eq!(cfg.query.max_page_size, 15);
        assert_eq!(cfg.query.max_page_number, 10);
        assert_eq!(cfg.query.default_page_size, 100);
        assert_eq!(cfg.ingest.batch_size().unwrap().get(), 10);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let cfg = CarnotConfig::parse("(query: (max_page_number: 4))").unwrap();
        assert_eq!(cfg.query.max_page_number, 4);
        assert_eq!(cfg.query.max_page_size, 15);
        assert_eq!(cfg.query.default_page_size, 100);
        assert_eq!(cfg.store.path, "carnot.sqlite");
    }

    #[test]
    fn test_parse_overrides() {
        let cfg = CarnotConfig::parse(
            r#"(
    server: (bind: "127.0.0.1:8080"),
    store: (path: ":memory:", timeout_ms: 250),
    query: (max_page_size: 50),
    ingest: (batch_size: 3),
)"#,
        )
        .unwrap();

        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.store.path, ":memory:");
        assert_eq!(cfg.store.timeout(), Duration::from_millis(250));
        assert_eq!(cfg.query.max_page_size, 50);
        assert_eq!(cfg.query.max_page_number, 10);
        assert_eq!(cfg.ingest.batch_size().unwrap().get(), 3);
    }

    #[test]
    fn test_zero_batch_size() {
        let cfg = CarnotConfig::parse("(ingest: (batch_size: 0))").unwrap();
        assert!(matches!(cfg.ingest.batch_size(), Err(ConfigError::ZeroBatchSize)));
    }

    #[test]
    fn test_bad_page_policy() {
        for src in [
            "(query: (default_page_size: -5))",
            "(query: (default_page_size: 0))",
            "(query: (max_page_size: -1))",
            "(query: (max_page_number: -1))",
        ] {
            assert!(
                matches!(CarnotConfig::parse(src), Err(ConfigError::BadPagePolicy(_))),
                "{src}"
            );
        }
    }

    #[test]
    fn test_bad_config() {
        assert!(CarnotConfig::parse("(store: (timeout_ms: \"soon\"))").is_err());
        assert!(CarnotConfig::load(Some("/nonexistent/carnot.ron")).is_err());
    }
}
