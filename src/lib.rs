//! Database password rotation
//!
//! Reads a secret's current value, generates a new random password and stores
//! it as a new version of the same secret in AWS Secrets Manager or Vault.

pub mod backends;
pub mod cli;
pub mod config;
pub mod password;
pub mod rotation;

pub use backends::{Backend, SecretBackend, SecretPayload, SecretStoreError};
pub use config::Config;
pub use password::{generate_password, PasswordGenerator};
pub use rotation::{rotate_secret, RotationOutput, RotationStatus};
