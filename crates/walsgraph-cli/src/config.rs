//! Layered CLI configuration: JSON file, then environment, then flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walsgraph_ingest::BuildConfig;
use walsgraph_query::QueryConfig;
use walsgraph_storage::StoreConfig;

pub const ENV_STORE: &str = "WALSGRAPH_STORE";
pub const ENV_BATCH_SIZE: &str = "WALSGRAPH_BATCH_SIZE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub build: BuildConfig,
    pub query: QueryConfig,
}

impl AppConfig {
    /// Read `path` if given; a missing `--config` file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(store) = var(ENV_STORE).filter(|s| !s.trim().is_empty()) {
            self.store.path = PathBuf::from(store);
        }
        if let Some(raw) = var(ENV_BATCH_SIZE) {
            self.build.batch_size = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_BATCH_SIZE} must be a positive integer, got `{raw}`"))?;
        }
        Ok(())
    }

    pub fn apply_flags(&mut self, store: Option<PathBuf>, batch_size: Option<usize>) {
        if let Some(store) = store {
            self.store.path = store;
        }
        if let Some(n) = batch_size {
            self.build.batch_size = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn layers_apply_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"store": {{"path": "from-file.wgdb"}}, "build": {{"batch_size": 50}}}}"#
        )
        .unwrap();

        let mut config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.store.path, PathBuf::from("from-file.wgdb"));
        assert_eq!(config.build.batch_size, 50);
        assert_eq!(config.build.max_retries, 3);
        assert_eq!(config.query.list_limit, 20);

        config
            .apply_env(|k| (k == ENV_BATCH_SIZE).then(|| "75".to_string()))
            .unwrap();
        assert_eq!(config.build.batch_size, 75);
        assert_eq!(config.store.path, PathBuf::from("from-file.wgdb"));

        config.apply_flags(Some(PathBuf::from("flag.wgdb")), None);
        assert_eq!(config.store.path, PathBuf::from("flag.wgdb"));
        assert_eq!(config.build.batch_size, 75);
    }

    #[test]
    fn bad_batch_size_is_reported() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|k| (k == ENV_BATCH_SIZE).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_BATCH_SIZE));
    }

    #[test]
    fn missing_config_file_fails() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/walsgraph.json"))).is_err());
        assert_eq!(AppConfig::load(None).unwrap().build.batch_size, 500);
    }
}
