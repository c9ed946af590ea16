use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// CLI configuration loaded from query-forge.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend family: "search" or "doc".
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_name")]
    pub index_or_collection: String,
    /// Database name (document store only).
    #[serde(default = "default_database")]
    pub database: String,
    /// Fields whose distinct values are collected and promoted to enums.
    #[serde(default)]
    pub category_fields: Vec<String>,
    /// Fields (and subtrees) dropped from the schema.
    #[serde(default)]
    pub fields_to_ignore: Vec<String>,
    /// Document sample window for schema inference (document store only).
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            url: default_url(),
            index_or_collection: default_name(),
            database: default_database(),
            category_fields: Vec::new(),
            fields_to_ignore: Vec::new(),
            sample_size: default_sample_size(),
        }
    }
}

/// Plan-generation tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_bucket_size")]
    pub bucket_size: usize,
    #[serde(default = "default_top_hits_size")]
    pub top_hits_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            bucket_size: default_bucket_size(),
            top_hits_size: default_top_hits_size(),
        }
    }
}

fn default_kind() -> String {
    "search".to_string()
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_name() -> String {
    "transactions".to_string()
}

fn default_database() -> String {
    "app".to_string()
}

fn default_sample_size() -> usize {
    1000
}

fn default_bucket_size() -> usize {
    100
}

fn default_top_hits_size() -> usize {
    100
}

/// Discovery order for the config file:
/// 1. `--config <path>` (the flag also reads `QUERY_FORGE_CONFIG`)
/// 2. `./query-forge.toml` (project-local)
/// 3. built-in defaults
pub fn load(explicit: Option<&Path>) -> Result<CliConfig, CliError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = Path::new("query-forge.toml");
            local.exists().then(|| local.to_path_buf())
        }
    };

    let Some(path) = path else {
        return Ok(CliConfig::default());
    };

    let text = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&text).map_err(|e| CliError::Config {
        message: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = CliConfig::default();
        assert_eq!(config.backend.kind, "search");
        assert_eq!(config.backend.url, "http://localhost:9200");
        assert_eq!(config.backend.sample_size, 1000);
        assert_eq!(config.query.bucket_size, 100);
        assert_eq!(config.query.top_hits_size, 100);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            [backend]
            kind = "doc"
            url = "mongodb://localhost:27017"
            index_or_collection = "payments"
            category_fields = ["card_type"]
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.kind, "doc");
        assert_eq!(config.backend.category_fields, ["card_type"]);
        assert_eq!(config.backend.sample_size, 1000);
        assert_eq!(config.query.bucket_size, 100);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.kind, "search");
    }

    #[test]
    fn missing_implicit_config_falls_back_to_defaults() {
        // No query-forge.toml in the test working directory.
        let config = load(None).unwrap();
        assert_eq!(config.backend.kind, "search");
    }
}
