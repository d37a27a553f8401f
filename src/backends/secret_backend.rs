use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value stored under a secret identifier after rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPayload {
    pub password: String,
}

impl SecretPayload {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Serialize to the JSON object string written to the store
    pub fn to_secret_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Current value of a secret as returned by the backend
#[derive(Debug, Clone)]
pub struct SecretValue {
    pub secret_string: String,
    pub version_id: Option<String>,
}

/// Failures surfaced by a secret backend
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret '{secret_id}' not found: {message}")]
    NotFound { secret_id: String, message: String },

    #[error("access denied to secret '{secret_id}': {message}")]
    AccessDenied { secret_id: String, message: String },

    #[error("request for secret '{secret_id}' rejected: {message}")]
    Validation { secret_id: String, message: String },

    #[error("secret store unavailable for '{secret_id}': {message}")]
    Transient { secret_id: String, message: String },
}

impl SecretStoreError {
    pub fn secret_id(&self) -> &str {
        match self {
            Self::NotFound { secret_id, .. }
            | Self::AccessDenied { secret_id, .. }
            | Self::Validation { secret_id, .. }
            | Self::Transient { secret_id, .. } => secret_id,
        }
    }
}

/// Trait for secret management backends (AWS Secrets Manager, Vault)
#[async_trait::async_trait]
pub trait SecretBackend: Send + Sync {
    /// Fetch the current value of a secret
    async fn get_current_value(&self, secret_id: &str) -> Result<SecretValue, SecretStoreError>;

    /// Store `payload` as a new version of the secret, returning the new version id if known
    async fn put_new_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
    ) -> Result<Option<String>, SecretStoreError>;

    /// Get the backend type name for display purposes
    fn backend_type(&self) -> &'static str;
}
