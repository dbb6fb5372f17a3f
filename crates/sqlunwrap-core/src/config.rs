use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{UnwrapError, UnwrapResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnwrapConfig {
    pub catalog: CatalogConfig,
    pub recover: RecoverConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog snapshot file used when `--snapshot` is not given
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverConfig {
    /// Decrypt every fragment of an object instead of the first row only
    pub all_fragments: bool,
    /// Replace unpaired surrogates with U+FFFD instead of failing
    pub lossy: bool,
    /// Recover several objects concurrently, one catalog session each
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was absent; built-in defaults are in effect
    Defaults,
}

impl UnwrapConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    ///
    /// Runs before logging is configured (the log level lives in this file),
    /// so the fallback is returned as [`ConfigSource::Defaults`] for the
    /// caller to report instead of being logged here.
    pub fn load(path: &Path) -> UnwrapResult<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| UnwrapError::Config(format!("parsing {}: {e}", path.display())))?;
        Ok((config, ConfigSource::File))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[catalog]
snapshot = "/var/lib/sqlunwrap/prod.toml"

[recover]
all_fragments = true
lossy = true
parallel = true

[output]
format = "json"

[log]
level = "debug"
format = "json"
"#;
        let config: UnwrapConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(
            config.catalog.snapshot,
            Some(PathBuf::from("/var/lib/sqlunwrap/prod.toml"))
        );
        assert!(config.recover.all_fragments);
        assert!(config.recover.lossy);
        assert!(config.recover.parallel);
        assert_eq!(config.output.format, "json");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: UnwrapConfig = toml::from_str("").unwrap();

        assert!(config.catalog.snapshot.is_none());
        assert!(!config.recover.all_fragments);
        assert!(!config.recover.lossy);
        assert!(!config.recover.parallel);
        assert_eq!(config.output.format, "text");
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[recover]
lossy = true
"#;
        let config: UnwrapConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert!(config.recover.lossy);
        // Defaults
        assert!(!config.recover.all_fragments);
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let (config, source) = UnwrapConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_load_existing_file_reports_file_source() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[log]\nlevel = \"info\"\n").unwrap();

        let (config, source) = UnwrapConfig::load(&path).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[recover]\nlossy = \"yes\"\n").unwrap();

        let err = UnwrapConfig::load(&path).unwrap_err();
        assert!(matches!(err, UnwrapError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut config = UnwrapConfig::default();
        config.catalog.snapshot = Some(PathBuf::from("snap.toml"));
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: UnwrapConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.catalog.snapshot, parsed.catalog.snapshot);
        assert_eq!(config.output.format, parsed.output.format);
    }
}
