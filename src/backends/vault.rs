use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::secret_backend::{SecretBackend, SecretPayload, SecretStoreError, SecretValue};

/// HashiCorp Vault KV v2 client
#[derive(Clone)]
pub struct VaultClient {
    client: Client,
    address: String,
    token: String,
    mount: String,
}

#[derive(Debug, Deserialize)]
struct VaultResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct VaultSecretData {
    data: Option<serde_json::Map<String, serde_json::Value>>,
    metadata: Option<VaultVersion>,
}

#[derive(Debug, Deserialize)]
struct VaultVersion {
    version: u64,
}

#[derive(Debug, Serialize)]
struct VaultWriteRequest<'a> {
    data: &'a SecretPayload,
}

impl VaultClient {
    /// Create a new Vault client
    pub fn new(address: String, token: String, mount: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token,
            mount,
        })
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}/v1/{}/data/{}", self.address, self.mount, path)
    }
}

/// Map a failed Vault HTTP response onto the store error taxonomy
fn status_error(secret_id: &str, status: StatusCode, body: String) -> SecretStoreError {
    let secret_id = secret_id.to_string();
    let message = format!("Vault responded with status {}: {}", status, body);
    match status {
        StatusCode::NOT_FOUND => SecretStoreError::NotFound { secret_id, message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SecretStoreError::AccessDenied { secret_id, message }
        }
        StatusCode::BAD_REQUEST
        | StatusCode::METHOD_NOT_ALLOWED
        | StatusCode::PRECONDITION_FAILED
        | StatusCode::UNPROCESSABLE_ENTITY => SecretStoreError::Validation { secret_id, message },
        _ => SecretStoreError::Transient { secret_id, message },
    }
}

fn transport_error(secret_id: &str, err: reqwest::Error) -> SecretStoreError {
    SecretStoreError::Transient {
        secret_id: secret_id.to_string(),
        message: err.to_string(),
    }
}

#[async_trait::async_trait]
impl SecretBackend for VaultClient {
    async fn get_current_value(&self, secret_id: &str) -> Result<SecretValue, SecretStoreError> {
        let url = self.data_url(secret_id);
        debug!("Reading secret from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Vault-Token", &self.token)
            .send()
            .await
            .map_err(|e| transport_error(secret_id, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(secret_id, status, body));
        }

        let vault_response: VaultResponse<VaultSecretData> = response
            .json()
            .await
            .map_err(|e| transport_error(secret_id, e))?;

        // A soft-deleted version comes back with a null data block
        let data = vault_response
            .data
            .data
            .ok_or_else(|| SecretStoreError::NotFound {
                secret_id: secret_id.to_string(),
                message: "current version has been deleted".to_string(),
            })?;

        let secret_string =
            serde_json::to_string(&data).map_err(|e| SecretStoreError::Validation {
                secret_id: secret_id.to_string(),
                message: format!("failed to encode secret data: {}", e),
            })?;

        Ok(SecretValue {
            secret_string,
            version_id: vault_response
                .data
                .metadata
                .map(|m| m.version.to_string()),
        })
    }

    async fn put_new_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
    ) -> Result<Option<String>, SecretStoreError> {
        let url = self.data_url(secret_id);
        debug!("Writing secret to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("X-Vault-Token", &self.token)
            .json(&VaultWriteRequest { data: payload })
            .send()
            .await
            .map_err(|e| transport_error(secret_id, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(secret_id, status, body));
        }

        // The write already happened; a missing version in the body is not an error
        let version = response
            .json::<VaultResponse<VaultVersion>>()
            .await
            .ok()
            .map(|r| r.data.version.to_string());

        info!("Successfully wrote secret to {}/{}", self.mount, secret_id);
        Ok(version)
    }

    fn backend_type(&self) -> &'static str {
        "HashiCorp Vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const SECRET: &str = "MyApp/DBPassword";
    const DATA_PATH: &str = "/v1/secret/data/MyApp/DBPassword";

    fn client_for(server: &mockito::Server) -> VaultClient {
        VaultClient::new(
            format!("{}/", server.url()),
            "test-token".to_string(),
            "secret".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_data_url() {
        let client = VaultClient::new(
            "http://localhost:8200/".to_string(),
            "test-token".to_string(),
            "secret".to_string(),
        )
        .unwrap();

        assert_eq!(
            client.data_url(SECRET),
            "http://localhost:8200/v1/secret/data/MyApp/DBPassword"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let cases = [
            (StatusCode::NOT_FOUND, "not_found"),
            (StatusCode::FORBIDDEN, "denied"),
            (StatusCode::UNAUTHORIZED, "denied"),
            (StatusCode::BAD_REQUEST, "validation"),
            (StatusCode::INTERNAL_SERVER_ERROR, "transient"),
            (StatusCode::SERVICE_UNAVAILABLE, "transient"),
        ];

        for (status, expected) in cases {
            let kind = match status_error(SECRET, status, String::new()) {
                SecretStoreError::NotFound { .. } => "not_found",
                SecretStoreError::AccessDenied { .. } => "denied",
                SecretStoreError::Validation { .. } => "validation",
                SecretStoreError::Transient { .. } => "transient",
            };
            assert_eq!(kind, expected, "{}", status);
        }
    }

    #[tokio::test]
    async fn test_get_current_value() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", DATA_PATH)
            .match_header("x-vault-token", "test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "data": { "password": "old123" },
                        "metadata": { "version": 3 }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let value = client_for(&server).get_current_value(SECRET).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value.secret_string, r#"{"password":"old123"}"#);
        assert_eq!(value.version_id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_get_current_value_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DATA_PATH)
            .with_status(404)
            .with_body(r#"{"errors":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_current_value(SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, SecretStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_current_value_deleted_version() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DATA_PATH)
            .with_status(200)
            .with_body(r#"{"data":{"data":null,"metadata":{"version":2}}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_current_value(SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, SecretStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_new_value() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DATA_PATH)
            .match_header("x-vault-token", "test-token")
            .match_body(Matcher::Json(json!({ "data": { "password": "n\"ew\\pw" } })))
            .with_status(200)
            .with_body(r#"{"data":{"version":4,"created_time":"2024-01-01T00:00:00Z"}}"#)
            .create_async()
            .await;

        let version = client_for(&server)
            .put_new_value(SECRET, &SecretPayload::new("n\"ew\\pw"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(version.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_put_new_value_forbidden() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DATA_PATH)
            .with_status(403)
            .with_body(r#"{"errors":["permission denied"]}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .put_new_value(SECRET, &SecretPayload::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretStoreError::AccessDenied { .. }));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let client = VaultClient::new(
            "http://127.0.0.1:1".to_string(),
            "test-token".to_string(),
            "secret".to_string(),
        )
        .unwrap();

        let err = client.get_current_value(SECRET).await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Transient { .. }));
    }
}
