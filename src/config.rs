use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default listen address; the port the web frontend expects
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Default location of the registry document
pub const DEFAULT_DATA_FILE: &str = "ipam.json";

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Registry storage settings
    pub storage: StorageConfig,
    /// (Optional) Default log filter, e.g. "info" or "ipam=debug"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on (default: "0.0.0.0:5000")
    pub bind: String,
}

/// Registry storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON registry document (default: "ipam.json")
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),
    #[error("Invalid storage configuration: {0}")]
    InvalidStorage(String),
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.bind_addr()?;

        if self.storage.path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidStorage(
                "path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, ValidationError> {
        self.server.bind.parse().map_err(|_| {
            ValidationError::InvalidServer(format!(
                "bind address '{}' is not a valid socket address",
                self.server.bind
            ))
        })
    }
}

/// Load and validate configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<ServiceConfig> {
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: ServiceConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub data_file: Option<PathBuf>,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut ServiceConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(bind) = &overrides.bind {
        config.server.bind = bind.clone();
    }

    if let Some(path) = &overrides.data_file {
        config.storage.path = path.clone();
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.storage.path, PathBuf::from("ipam.json"));
        assert!(config.log_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
server:
  bind: "127.0.0.1:8080"
storage:
  path: "/data/ipam.json"
log_level: debug
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.storage.path, PathBuf::from("/data/ipam.json"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let yaml = r#"
storage:
  path: "state/registry.json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.storage.path, PathBuf::from("state/registry.json"));
    }

    #[test]
    fn test_load_rejects_invalid_bind() {
        let yaml = r#"
server:
  bind: "localhost"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let yaml = r#"
server:
  port: 5000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ServiceConfig::default();
        let overrides = CliOverrides {
            bind: Some("127.0.0.1:9000".to_string()),
            data_file: Some(PathBuf::from("/tmp/ipam-test.json")),
        };

        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.storage.path, PathBuf::from("/tmp/ipam-test.json"));

        let bad = CliOverrides {
            data_file: Some(PathBuf::new()),
            ..CliOverrides::default()
        };
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
