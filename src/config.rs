use thiserror::Error;
use url::Url;

use crate::links::DEFAULT_TABLE;
use crate::token::{DEFAULT_TOKEN_LENGTH, MAX_TOKEN_LENGTH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub links: LinkConfig,
    pub storage: StorageConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    /// Origin short links are handed out under, e.g. `https://share.example`.
    pub public_origin: Url,
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub table: String,
    pub token_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    /// Directory holding the redb link table for the local backend
    pub data_dir: String,
    /// Directory for objects stored by the local backend
    pub local_storage_path: String,
    /// Project URL (required when backend is supabase)
    pub supabase_url: Option<Url>,
    /// Anonymous API key (required when backend is supabase)
    pub supabase_anon_key: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_origin: Url::parse("http://localhost:8080").expect("static URL is valid"),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: "files".to_string(),
            data_dir: "./data".to_string(),
            local_storage_path: "./files".to_string(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = NodeConfig::default();
        let bind_address = var("BIND_ADDRESS").unwrap_or(defaults.bind_address);

        let public_origin = match var("PUBLIC_ORIGIN") {
            Some(raw) => parse_url("PUBLIC_ORIGIN", &raw)?,
            None => defaults.public_origin,
        };

        let max_upload_size = var("MAX_UPLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let token_length = match var("TOKEN_LENGTH") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!("TOKEN_LENGTH must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_TOKEN_LENGTH,
        };

        let backend = match var("STORAGE_BACKEND")
            .unwrap_or_else(|| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "supabase" => StorageBackend::Supabase,
            _ => StorageBackend::Local,
        };

        let supabase_url = var("SUPABASE_URL")
            .map(|raw| parse_url("SUPABASE_URL", &raw))
            .transpose()?;

        let storage_defaults = StorageConfig::default();
        let config = Config {
            node: NodeConfig {
                bind_address,
                public_origin,
            },
            links: LinkConfig {
                table: var("LINKS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                token_length,
            },
            storage: StorageConfig {
                backend,
                bucket: var("BUCKET_NAME").unwrap_or(storage_defaults.bucket),
                data_dir: var("DATA_DIR").unwrap_or(storage_defaults.data_dir),
                local_storage_path: var("LOCAL_STORAGE_PATH")
                    .unwrap_or(storage_defaults.local_storage_path),
                supabase_url,
                supabase_anon_key: var("SUPABASE_ANON_KEY"),
            },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TOKEN_LENGTH).contains(&self.links.token_length) {
            return Err(ConfigError::ValidationError(format!(
                "TOKEN_LENGTH must be between 1 and {MAX_TOKEN_LENGTH}"
            )));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "BUCKET_NAME cannot be empty".to_string(),
            ));
        }

        if self.links.table.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "LINKS_TABLE cannot be empty".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Supabase {
            if self.storage.supabase_url.is_none() {
                return Err(ConfigError::ValidationError(
                    "SUPABASE_URL is required when STORAGE_BACKEND=supabase".to_string(),
                ));
            }
            if self.storage.supabase_anon_key.is_none() {
                return Err(ConfigError::ValidationError(
                    "SUPABASE_ANON_KEY is required when STORAGE_BACKEND=supabase".to_string(),
                ));
            }
        }

        if self.storage.backend == StorageBackend::Local && self.node.public_origin.path() != "/" {
            tracing::warn!(
                origin = %self.node.public_origin,
                "PUBLIC_ORIGIN has a path; object URLs keep it, short links drop it"
            );
        }

        Ok(())
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::ValidationError(format!("{name} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be an http(s) URL"
        )));
    }
    Ok(url)
}
