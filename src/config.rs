//! Credential sources and client configuration for Firestore access.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// GCE/Cloud Run metadata endpoint that serves tokens for the instance's
/// default service account.
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the admin-mode access token comes from.
///
/// Always chosen explicitly at process start; there is no implicit global
/// credential lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Service-account key file; a token is minted through the platform CLI
    /// with `GOOGLE_APPLICATION_CREDENTIALS` pointed at the file.
    KeyFile(PathBuf),
    /// Token supplied directly through a flag or environment variable.
    Environment(String),
    /// Token fetched from the platform metadata server.
    AmbientIdentity,
}

impl Credentials {
    /// Picks the credential source from the values a binary was started
    /// with. Precedence: explicit token, then key file, then ambient
    /// platform identity.
    pub fn from_sources(access_token: Option<String>, key_file: Option<PathBuf>) -> Self {
        if let Some(token) = access_token.filter(|token| !token.trim().is_empty()) {
            return Credentials::Environment(token);
        }
        if let Some(path) = key_file {
            return Credentials::KeyFile(path);
        }
        Credentials::AmbientIdentity
    }

    /// Resolves this source to a bearer token.
    pub async fn resolve_token(&self, timeout: Duration) -> Result<String> {
        match self {
            Credentials::Environment(token) => {
                let token = token.trim();
                anyhow::ensure!(!token.is_empty(), "provided access token is empty");
                Ok(token.to_string())
            }
            Credentials::KeyFile(path) => {
                anyhow::ensure!(
                    path.is_file(),
                    "credentials file {:?} does not exist",
                    path
                );
                debug!(path = ?path, "minting access token from key file");
                let output = Command::new("gcloud")
                    .args(["auth", "application-default", "print-access-token"])
                    .env("GOOGLE_APPLICATION_CREDENTIALS", path)
                    .output()
                    .await
                    .context("failed to run gcloud to mint an access token")?;
                anyhow::ensure!(
                    output.status.success(),
                    "gcloud token mint exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                let token = String::from_utf8(output.stdout)
                    .context("gcloud returned a non-UTF-8 token")?;
                let token = token.trim().to_string();
                anyhow::ensure!(!token.is_empty(), "gcloud returned an empty access token");
                Ok(token)
            }
            Credentials::AmbientIdentity => {
                debug!("fetching access token from the metadata server");
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .context("failed to build metadata HTTP client")?;
                let resp = client
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .context("failed to reach the metadata server for ambient credentials")?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    anyhow::bail!("metadata token request failed ({}): {}", status, body);
                }
                let token: MetadataToken = resp
                    .json()
                    .await
                    .context("failed to parse metadata token response")?;
                anyhow::ensure!(
                    !token.access_token.is_empty(),
                    "metadata server returned an empty access token"
                );
                Ok(token.access_token)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Client-mode configuration bundle handed to the hosted database's web
/// surface. Injected at process start, never compiled into source.
#[derive(Debug, Clone)]
pub struct WebAppConfig {
    /// Browser API key authorizing client-mode requests.
    pub api_key: String,
    /// Authentication domain of the project.
    pub auth_domain: String,
    /// Google Cloud project that owns the database.
    pub project_id: String,
    /// Default storage bucket of the project.
    pub storage_bucket: String,
    /// Cloud messaging sender id.
    pub messaging_sender_id: String,
    /// Registered application id.
    pub app_id: String,
}

impl WebAppConfig {
    /// Builds a validated config bundle.
    pub fn new(
        api_key: String,
        auth_domain: String,
        project_id: String,
        storage_bucket: String,
        messaging_sender_id: String,
        app_id: String,
    ) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing web API key");
        anyhow::ensure!(!project_id.trim().is_empty(), "missing project id");
        Ok(Self {
            api_key,
            auth_domain,
            project_id,
            storage_bucket,
            messaging_sender_id,
            app_id,
        })
    }
}
