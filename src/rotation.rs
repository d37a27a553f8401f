use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backends::{SecretBackend, SecretPayload};
use crate::password::PasswordGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStatus {
    Success,
}

/// Result returned to the invoker of a rotation.
///
/// Carries the new password in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationOutput {
    pub status: RotationStatus,
    pub new_password: String,
}

/// Rotate `secret_id`: read its current value, generate a password and store it
/// as a new version.
///
/// Any backend failure aborts the rotation. Nothing is retried and no write
/// happens when the read fails.
pub async fn rotate_secret<R>(
    backend: &dyn SecretBackend,
    secret_id: &str,
    generator: &PasswordGenerator,
    rng: &mut R,
) -> Result<RotationOutput>
where
    R: Rng + ?Sized + Send,
{
    info!("Rotating secret {} ({})", secret_id, backend.backend_type());

    let current = backend
        .get_current_value(secret_id)
        .await
        .context("Failed to read current secret")?;
    debug!(
        "Current version of {}: {}",
        secret_id,
        current.version_id.as_deref().unwrap_or("unknown")
    );

    let new_password = generator.generate(rng);
    let payload = SecretPayload::new(new_password.clone());

    let version = backend
        .put_new_value(secret_id, &payload)
        .await
        .context("Failed to write rotated secret")?;

    info!(
        "Successfully rotated secret {} (new version: {})",
        secret_id,
        version.as_deref().unwrap_or("unknown")
    );
    Ok(RotationOutput {
        status: RotationStatus::Success,
        new_password,
    })
}
