use anyhow::Result;
use aws_config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use tracing::{debug, info};

use super::secret_backend::{SecretBackend, SecretPayload, SecretStoreError, SecretValue};

const DEFAULT_REGION: &str = "us-east-1";

/// AWS Secrets Manager client
pub struct AwsSecretsClient {
    client: SecretsManagerClient,
    region: String,
}

impl AwsSecretsClient {
    /// Create a new AWS Secrets Manager client
    pub async fn new(region: Option<String>) -> Result<Self> {
        let region_str = resolve_region(region, std::env::var("AWS_REGION").ok());

        // Credentials come from the default provider chain, the region is pinned
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region_str.clone()))
            .load()
            .await;
        let client = SecretsManagerClient::new(&config);

        Ok(Self {
            client,
            region: region_str,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn resolve_region(configured: Option<String>, from_env: Option<String>) -> String {
    configured
        .filter(|r| !r.is_empty())
        .or(from_env.filter(|r| !r.is_empty()))
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Map a Secrets Manager error code onto the store error taxonomy
fn classify_error_code(secret_id: &str, code: Option<&str>, message: String) -> SecretStoreError {
    let secret_id = secret_id.to_string();
    match code {
        Some("ResourceNotFoundException") => SecretStoreError::NotFound { secret_id, message },
        Some("AccessDeniedException") | Some("DecryptionFailure") => {
            SecretStoreError::AccessDenied { secret_id, message }
        }
        Some("InvalidParameterException")
        | Some("InvalidRequestException")
        | Some("EncryptionFailure")
        | Some("LimitExceededException")
        | Some("ResourceExistsException") => SecretStoreError::Validation { secret_id, message },
        _ => SecretStoreError::Transient { secret_id, message },
    }
}

fn store_error<E, R>(secret_id: &str, err: SdkError<E, R>) -> SecretStoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    classify_error_code(secret_id, ProvideErrorMetadata::code(&err), message)
}

#[async_trait::async_trait]
impl SecretBackend for AwsSecretsClient {
    async fn get_current_value(&self, secret_id: &str) -> Result<SecretValue, SecretStoreError> {
        debug!("Reading secret from AWS Secrets Manager: {}", secret_id);

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| store_error(secret_id, e))?;

        let secret_string = response
            .secret_string()
            .ok_or_else(|| SecretStoreError::Validation {
                secret_id: secret_id.to_string(),
                message: "secret has no string value".to_string(),
            })?
            .to_string();

        Ok(SecretValue {
            secret_string,
            version_id: response.version_id().map(str::to_string),
        })
    }

    async fn put_new_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
    ) -> Result<Option<String>, SecretStoreError> {
        debug!("Writing new secret version to AWS Secrets Manager: {}", secret_id);

        let secret_string =
            payload
                .to_secret_string()
                .map_err(|e| SecretStoreError::Validation {
                    secret_id: secret_id.to_string(),
                    message: format!("failed to serialize payload: {}", e),
                })?;

        let response = self
            .client
            .put_secret_value()
            .secret_id(secret_id)
            .secret_string(secret_string)
            .send()
            .await
            .map_err(|e| store_error(secret_id, e))?;

        info!(
            "Stored new version of secret '{}' in AWS Secrets Manager ({})",
            secret_id, self.region
        );
        Ok(response.version_id().map(str::to_string))
    }

    fn backend_type(&self) -> &'static str {
        "AWS Secrets Manager"
    }
}
