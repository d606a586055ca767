//! Connection and naming configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) gives an in-process loopback engine with snake_case
//! methods forwarded as camelCase.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::proxy::Conventions;

/// Environment variable naming a config file for the process-wide context.
pub const CONFIG_ENV: &str = "PROBGATE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Naming conventions used by the remote-object proxy
    #[serde(default)]
    pub naming: Conventions,
}

/// Which engine to talk to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayConfig {
    /// In-process engine, seeded for reproducible sampling
    Loopback {
        #[serde(default = "default_seed")]
        seed: u64,
    },

    /// Gateway server on a socket
    Tcp {
        #[serde(default = "default_host")]
        host: String,

        #[serde(default = "default_port")]
        port: u16,

        /// Shared secret sent before the first command
        #[serde(default)]
        auth_token: Option<String>,
    },
}

fn default_seed() -> u64 {
    42
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    25333
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::Loopback {
            seed: default_seed(),
        }
    }
}

impl GatewayConfig {
    /// Socket gateway on the default host and port.
    pub fn tcp() -> Self {
        GatewayConfig::Tcp {
            host: default_host(),
            port: default_port(),
            auth_token: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the file named by `PROBGATE_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::NamingConvention;

    #[test]
    fn test_empty_config_defaults() {
        let config = BridgeConfig::from_toml("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.gateway, GatewayConfig::Loopback { seed: 42 });
        assert_eq!(config.naming.local, NamingConvention::SnakeCase);
        assert_eq!(config.naming.remote, NamingConvention::CamelCase);
    }

    #[test]
    fn test_tcp_config() {
        let config = BridgeConfig::from_toml(
            r#"
            [gateway]
            kind = "tcp"
            port = 25334
            auth_token = "s3cret"

            [naming]
            local = "camel_case"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.gateway,
            GatewayConfig::Tcp {
                host: "127.0.0.1".into(),
                port: 25334,
                auth_token: Some("s3cret".into()),
            }
        );
        assert_eq!(config.naming.local, NamingConvention::CamelCase);
        assert_eq!(config.naming.remote, NamingConvention::CamelCase);
    }

    #[test]
    fn test_unknown_gateway_kind_rejected() {
        assert!(BridgeConfig::from_toml("[gateway]\nkind = \"carrier_pigeon\"\n").is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = BridgeConfig::from_file(Path::new("/nonexistent/probgate.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/probgate.toml"));
    }
}
