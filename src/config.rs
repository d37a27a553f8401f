use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::backends::BackendType;
use crate::password::DEFAULT_PASSWORD_LENGTH;

pub const DEFAULT_SECRET_ID: &str = "MyApp/DBPassword";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub aws: Option<AwsConfig>,
    #[serde(default)]
    pub vault: Option<VaultConfig>,
    #[serde(default)]
    pub rotation: RotationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub address: String,
    pub token: String,
    #[serde(default = "default_vault_mount")]
    pub mount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_secret_id")]
    pub secret_id: String,
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

fn default_backend() -> String {
    "aws".to_string()
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

fn default_secret_id() -> String {
    DEFAULT_SECRET_ID.to_string()
}

fn default_password_length() -> usize {
    DEFAULT_PASSWORD_LENGTH
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            secret_id: default_secret_id(),
            password_length: default_password_length(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("SECRET_BACKEND")
            .map(|b| b.to_lowercase())
            .unwrap_or_else(default_backend);

        let vault = match (lookup("VAULT_ADDR"), lookup("VAULT_TOKEN")) {
            (Some(address), Some(token)) => Some(VaultConfig {
                address,
                token,
                mount: lookup("VAULT_MOUNT").unwrap_or_else(default_vault_mount),
            }),
            _ => None,
        };

        let password_length = match lookup("PASSWORD_LENGTH") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PASSWORD_LENGTH is not a valid length: {}", raw))?,
            None => default_password_length(),
        };

        let rotation = RotationConfig {
            secret_id: lookup("SECRET_ID").unwrap_or_else(default_secret_id),
            password_length,
        };

        Ok(Self {
            backend,
            aws: Some(AwsConfig {
                region: lookup("AWS_REGION"),
            }),
            vault,
            rotation,
        })
    }

    /// Check the configuration is usable for a rotation
    pub fn validate(&self) -> Result<()> {
        self.backend_type()?;
        if self.rotation.secret_id.trim().is_empty() {
            anyhow::bail!("rotation.secret_id must not be empty");
        }
        if self.rotation.password_length == 0 {
            anyhow::bail!("rotation.password_length must be greater than zero");
        }
        Ok(())
    }

    pub fn backend_type(&self) -> Result<BackendType> {
        self.backend.parse().map_err(anyhow::Error::msg)
    }

    /// Create a sample configuration file
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self {
            backend: default_backend(),
            aws: Some(AwsConfig {
                region: Some("us-east-1".to_string()),
            }),
            vault: Some(VaultConfig {
                address: "http://127.0.0.1:8200".to_string(),
                token: "your-vault-token-here".to_string(),
                mount: default_vault_mount(),
            }),
            rotation: RotationConfig::default(),
        };

        let toml_string =
            toml::to_string_pretty(&sample).context("Failed to serialize sample config")?;
        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write sample config to {:?}", path.as_ref()))?;

        Ok(())
    }
}
