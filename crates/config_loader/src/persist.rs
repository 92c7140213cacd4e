//! Sink 配置持久化
//!
//! 首次运行时命令行给出的 sink 配置写入 `sink.config.json`，之后的运行
//! 在没有显式 sink 配置时从这里读取。

use std::path::{Path, PathBuf};

use contracts::{ContractError, SinkConfig};

use crate::validator;

/// 默认存储文件名 (相对工作目录)
pub const DEFAULT_SINK_STORE: &str = "sink.config.json";

/// 持久化的 sink 配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkStore {
    path: PathBuf,
}

impl Default for SinkStore {
    fn default() -> Self {
        Self::new(DEFAULT_SINK_STORE)
    }
}

impl SinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 读取已保存的配置；文件不存在时返回 `Ok(None)`
    pub fn load(&self) -> Result<Option<SinkConfig>, ContractError> {
        if !self.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: SinkConfig =
            serde_json::from_str(&content).map_err(|e| ContractError::ConfigParse {
                message: format!("sink store {} is corrupt: {e}", self.path.display()),
                source: Some(Box::new(e)),
            })?;
        validator::validate_sink(&config)?;
        Ok(Some(config))
    }

    /// 校验后保存，覆盖旧配置
    pub fn save(&self, config: &SinkConfig) -> Result<(), ContractError> {
        validator::validate_sink(config)?;
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn network_sink() -> SinkConfig {
        SinkConfig {
            name: "udp".to_string(),
            sink_type: SinkType::Network,
            params: HashMap::from([("addr".to_string(), "127.0.0.1:9999".to_string())]),
        }
    }

    #[test]
    fn test_missing_store_loads_none() {
        let dir = tempdir().unwrap();
        let store = SinkStore::new(dir.path().join(DEFAULT_SINK_STORE));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SinkStore::new(dir.path().join("nested").join("sink.json"));

        store.save(&network_sink()).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(network_sink()));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let store = SinkStore::new(dir.path().join("sink.json"));

        let mut config = network_sink();
        config.params.clear();
        assert!(store.save(&config).unwrap_err().is_config());
        assert!(!store.exists());
    }

    #[test]
    fn test_corrupt_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sink.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SinkStore::new(path).load().unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }
}
