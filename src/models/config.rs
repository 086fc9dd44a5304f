use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DOCUMENT_BATCH_SIZE: usize = 500;
pub const DEFAULT_CONNECTIONS: usize = 50;
pub const DEFAULT_SUB_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BLOCKS_TO_FILTER: [&str; 2] = ["Table", "Figure"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub filter: FilterConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vindex").join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::Path("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

/// Connection and batching settings for the search index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index instance URL. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Path to the TLS key PEM. Required, must exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,

    /// Path to the TLS cert PEM. Required, must exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,

    /// Family documents buffered before a flush is triggered.
    #[serde(default = "default_document_batch_size")]
    pub document_batch_size: usize,

    /// Simultaneous in-flight requests per bulk call.
    #[serde(default = "default_connections")]
    pub connections: usize,

    /// Entries handed to one bulk call at a time.
    #[serde(default = "default_sub_batch_size")]
    pub sub_batch_size: usize,
}

fn default_document_batch_size() -> usize {
    DEFAULT_DOCUMENT_BATCH_SIZE
}

fn default_connections() -> usize {
    DEFAULT_CONNECTIONS
}

fn default_sub_batch_size() -> usize {
    DEFAULT_SUB_BATCH_SIZE
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_path: None,
            cert_path: None,
            document_batch_size: default_document_batch_size(),
            connections: default_connections(),
            sub_batch_size: default_sub_batch_size(),
        }
    }
}

/// Validated connection settings, resolved from an [`IndexConfig`].
#[derive(Debug, Clone)]
pub struct IndexConnection {
    pub url: String,
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl IndexConfig {
    /// Resolves the connection settings, collecting every issue rather than
    /// failing on the first one.
    pub fn connection(&self) -> Result<IndexConnection, ConfigError> {
        let mut issues = Vec::new();

        if self.url.as_deref().unwrap_or_default().is_empty() {
            issues.push(
                "index instance URL must be configured using --index-url \
                 or environment variable VESPA_INSTANCE_URL"
                    .to_string(),
            );
        }

        check_pem_path(&mut issues, self.key_path.as_deref(), "key", "VESPA_KEY_LOCATION");
        check_pem_path(
            &mut issues,
            self.cert_path.as_deref(),
            "cert",
            "VESPA_CERT_LOCATION",
        );

        if self.document_batch_size == 0 {
            issues.push("document batch size must be at least 1".to_string());
        }
        if self.connections == 0 {
            issues.push("connections must be at least 1".to_string());
        }
        if self.sub_batch_size == 0 {
            issues.push("sub-batch size must be at least 1".to_string());
        }

        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }

        Ok(IndexConnection {
            url: self.url.clone().unwrap_or_default(),
            key_path: self.key_path.clone().unwrap_or_default(),
            cert_path: self.cert_path.clone().unwrap_or_default(),
        })
    }
}

fn check_pem_path(issues: &mut Vec<String>, path: Option<&Path>, kind: &str, env_var: &str) {
    match path {
        None => issues.push(format!(
            "TLS {} location must be configured using --{}-path \
             or environment variable {}",
            kind, kind, env_var
        )),
        Some(path) if !path.is_file() => issues.push(format!(
            "configured {} location does not exist or is not a file: {}",
            kind,
            path.display()
        )),
        Some(_) => {}
    }
}

/// Which text block categories to drop before generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_blocks_to_filter")]
    pub excluded_block_types: Vec<String>,
}

fn default_blocks_to_filter() -> Vec<String> {
    DEFAULT_BLOCKS_TO_FILTER
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_block_types: default_blocks_to_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.index.document_batch_size, DEFAULT_DOCUMENT_BATCH_SIZE);
        assert_eq!(config.index.connections, DEFAULT_CONNECTIONS);
        assert_eq!(config.index.sub_batch_size, DEFAULT_SUB_BATCH_SIZE);
        assert_eq!(
            config.filter.excluded_block_types,
            vec!["Table".to_string(), "Figure".to_string()]
        );
    }

    #[test]
    fn test_connection_collects_all_issues() {
        let config = IndexConfig {
            url: None,
            key_path: Some(PathBuf::from("/nonexistent/key.pem")),
            cert_path: None,
            ..Default::default()
        };

        match config.connection() {
            Err(ConfigError::Invalid(issues)) => {
                assert_eq!(issues.len(), 3);
                assert!(issues[0].contains("VESPA_INSTANCE_URL"));
                assert!(issues[1].contains("does not exist"));
                assert!(issues[2].contains("VESPA_CERT_LOCATION"));
            }
            other => panic!("expected aggregated config error, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_valid() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.pem");
        let cert_path = dir.path().join("cert.pem");
        writeln!(std::fs::File::create(&key_path).unwrap(), "key").unwrap();
        writeln!(std::fs::File::create(&cert_path).unwrap(), "cert").unwrap();

        let config = IndexConfig {
            url: Some("https://index.example.com".to_string()),
            key_path: Some(key_path.clone()),
            cert_path: Some(cert_path),
            ..Default::default()
        };

        let connection = config.connection().unwrap();
        assert_eq!(connection.url, "https://index.example.com");
        assert_eq!(connection.key_path, key_path);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pem = dir.path().join("id.pem");
        std::fs::write(&pem, "pem").unwrap();

        let config = IndexConfig {
            url: Some("https://index.example.com".to_string()),
            key_path: Some(pem.clone()),
            cert_path: Some(pem),
            document_batch_size: 0,
            ..Default::default()
        };

        match config.connection() {
            Err(ConfigError::Invalid(issues)) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].contains("batch size"));
            }
            other => panic!("expected aggregated config error, got {:?}", other),
        }
    }
}
