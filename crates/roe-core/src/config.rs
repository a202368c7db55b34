use serde::{Deserialize, Serialize};

use crate::error::{RoeError, RoeResult};

/// Top-level configuration (loaded from roe.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoeConfig {
    pub split: SplitConfig,
    pub log: LogConfig,
    pub crypto: CryptoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Largest cleartext slice stored in one container (default: 24000000)
    pub max_chunk_size: u64,
    /// Smallest accepted value for `max_chunk_size` (default: 1000000)
    pub min_chunk_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// How the passphrase is stretched into the container key
    pub key_schedule: KeySchedule,
}

/// Passphrase stretching schedule. Both produce a 32-byte key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySchedule {
    /// SHA-256 of the passphrase, then 256 rounds of SHA-256 over the previous digest
    #[default]
    Rehash,
    /// One running SHA-256 state fed the passphrase and then its own digest 256 times
    Running,
}

pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 24_000_000;
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 1_000_000;

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl RoeConfig {
    pub fn validate(&self) -> RoeResult<()> {
        if self.split.min_chunk_size == 0 {
            return Err(RoeError::Config("split.min_chunk_size must be positive".into()));
        }
        if self.split.max_chunk_size < self.split.min_chunk_size {
            return Err(RoeError::Config(format!(
                "split.max_chunk_size ({}) is below split.min_chunk_size ({})",
                self.split.max_chunk_size, self.split.min_chunk_size
            )));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(RoeError::Config(format!(
                "log.format must be \"json\" or \"text\", got \"{other}\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[split]
max_chunk_size = 5000000
min_chunk_size = 2000000

[log]
level = "debug"
format = "json"

[crypto]
key_schedule = "running"
"#;
        let config: RoeConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.split.max_chunk_size, 5_000_000);
        assert_eq!(config.split.min_chunk_size, 2_000_000);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.crypto.key_schedule, KeySchedule::Running);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_defaults() {
        let config: RoeConfig = toml::from_str("").unwrap();

        assert_eq!(config.split.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(config.split.min_chunk_size, DEFAULT_MIN_CHUNK_SIZE);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.crypto.key_schedule, KeySchedule::Rehash);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[split]
max_chunk_size = 1000000
"#;
        let config: RoeConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.split.max_chunk_size, 1_000_000);
        assert_eq!(config.split.min_chunk_size, DEFAULT_MIN_CHUNK_SIZE);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_validate_rejects_small_chunks() {
        let mut config = RoeConfig::default();
        config.split.max_chunk_size = 999_999;
        assert!(matches!(config.validate(), Err(RoeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = RoeConfig::default();
        config.log.format = "xml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_schedule_is_a_parse_error() {
        let result: Result<RoeConfig, _> = toml::from_str("[crypto]\nkey_schedule = \"md5\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = RoeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: RoeConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.split.max_chunk_size, parsed.split.max_chunk_size);
        assert_eq!(config.log.format, parsed.log.format);
        assert_eq!(config.crypto.key_schedule, parsed.crypto.key_schedule);
    }
}
