//! CLI parsing and command execution
//!
//! This module handles command-line argument parsing and routes commands to the appropriate handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use std::path::PathBuf;
use tracing::info;

use crate::backends::{AwsSecretsClient, Backend, BackendType, VaultClient};
use crate::config::Config;
use crate::password::{self, PasswordGenerator};
use crate::rotation;

#[derive(Parser)]
#[command(name = "rotate-secret")]
#[command(about = "Rotate a database password stored in AWS Secrets Manager or HashiCorp Vault", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "ROTATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Secret backend to use (aws or vault)
    #[arg(long)]
    pub backend: Option<String>,

    /// Identifier of the secret to rotate (overrides config)
    #[arg(long)]
    pub secret_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a sample configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "rotator-config.toml")]
        output: PathBuf,
    },

    /// Rotate the secret and print the new value as JSON
    Rotate,

    /// Print the current value of the secret
    Read,

    /// Generate a password without storing it
    GenPassword {
        /// Length of the generated password
        #[arg(short, long)]
        length: Option<usize>,
    },
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Handle init command separately as it doesn't need backend
    if let Commands::Init { output } = cli.command {
        Config::create_sample(&output)
            .with_context(|| format!("Failed to create sample config at {:?}", output))?;
        info!("Sample configuration created at {:?}", output);
        return Ok(());
    }

    let config = load_config(cli.config, cli.backend, cli.secret_id)?;

    if let Commands::GenPassword { length } = cli.command {
        let length = length.unwrap_or(config.rotation.password_length);
        println!("{}", password::generate_password(length));
        return Ok(());
    }

    let backend = create_backend(&config).await?;
    let secret_id = config.rotation.secret_id.as_str();

    match cli.command {
        Commands::Init { .. } | Commands::GenPassword { .. } => unreachable!(), // Handled above

        Commands::Rotate => {
            let generator = PasswordGenerator::new(config.rotation.password_length);
            let output = rotation::rotate_secret(backend.as_ref(), secret_id, &generator, &mut OsRng)
                .await
                .context("Failed to rotate secret")?;

            let json = serde_json::to_string_pretty(&output)
                .context("Failed to serialize rotation result")?;
            println!("{}", json);
        }

        Commands::Read => {
            let current = backend
                .get_current_value(secret_id)
                .await
                .context("Failed to read secret")?;
            eprintln!("WARNING: Secret value will be displayed. Ensure this output is secured.");
            println!("{}", current.secret_string);
        }
    }

    Ok(())
}

/// Resolve configuration from file or environment and apply CLI overrides
fn load_config(
    path: Option<PathBuf>,
    backend: Option<String>,
    secret_id: Option<String>,
) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        Config::from_env().context("Failed to load config from environment")?
    };

    if let Some(backend) = backend {
        config.backend = backend.to_lowercase();
    }
    if let Some(secret_id) = secret_id {
        config.rotation.secret_id = secret_id;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Create a backend instance based on configuration
async fn create_backend(config: &Config) -> Result<Backend> {
    match config.backend_type()? {
        BackendType::Aws => {
            let region = config.aws.as_ref().and_then(|aws| aws.region.clone());
            let aws_client = AwsSecretsClient::new(region)
                .await
                .context("Failed to create AWS Secrets Manager client")?;
            info!("Using AWS Secrets Manager in {}", aws_client.region());
            Ok(Box::new(aws_client))
        }
        BackendType::Vault => {
            let vault_config = config.vault.as_ref().ok_or_else(|| {
                anyhow::anyhow!("Vault configuration not found. Set VAULT_ADDR/VAULT_TOKEN or configure [vault] section")
            })?;
            let vault_client = VaultClient::new(
                vault_config.address.clone(),
                vault_config.token.clone(),
                vault_config.mount.clone(),
            )
            .context("Failed to create Vault client")?;
            Ok(Box::new(vault_client))
        }
    }
}
