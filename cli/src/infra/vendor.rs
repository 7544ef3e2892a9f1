//! Vendor API infrastructure — implements `VendorApi` over the Falcon REST API.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{DownloadReport, VendorApi};
use crate::domain::{ArtifactDescriptor, Credentials};

const TOKEN_PATH: &str = "/oauth2/token";
const REVOKE_PATH: &str = "/oauth2/revoke";
const INSTALLERS_PATH: &str = "/sensors/combined/installers/v1";
const DOWNLOAD_PATH: &str = "/sensors/entities/download-installer/v3";
const UNINSTALL_TOKEN_PATH: &str = "/policy/combined/reveal-uninstall-token/v1";

/// Audit message recorded by the vendor when a maintenance token is revealed.
const UNINSTALL_AUDIT_MESSAGE: &str = "fleetops uninstall";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    errors: Option<Vec<ApiError>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Standard `{resources, errors}` response wrapper.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
    #[serde(default)]
    errors: Option<Vec<ApiError>>,
}

#[derive(Debug, Deserialize)]
struct InstallerResource {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sha256: String,
}

#[derive(Debug, Deserialize)]
struct UninstallTokenResource {
    #[serde(default)]
    uninstall_token: String,
}

fn describe_errors(errors: Option<&[ApiError]>) -> Option<String> {
    let errors = errors.filter(|e| !e.is_empty())?;
    Some(
        errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Fail on non-2xx statuses, keeping a snippet of the body for the log.
async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    anyhow::bail!("{what} returned HTTP {status}: {snippet}")
}

// ── Client ────────────────────────────────────────────────────────────────────

/// reqwest-backed client for the Falcon identity, catalog and download API.
pub struct FalconApi {
    client: Client,
    base_url: String,
}

impl FalconApi {
    /// Build a client for `base_url`. Per-request timeouts are left at the
    /// transport default.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("fleetops/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl VendorApi for FalconApi {
    async fn request_token(&self, creds: &Credentials) -> Result<String> {
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
            ])
            .send()
            .await
            .context("token request failed")?;
        let response = ensure_success(response, "token endpoint").await?;
        let body: TokenResponse = response
            .json()
            .await
            .context("token response is not valid JSON")?;
        if let Some(errors) = describe_errors(body.errors.as_deref()) {
            anyhow::bail!("token endpoint reported errors: {errors}");
        }
        body.access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("token endpoint returned an empty access token"))
    }

    async fn revoke_token(&self, creds: &Credentials, token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(REVOKE_PATH))
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("token", token)])
            .send()
            .await
            .context("revoke request failed")?;
        ensure_success(response, "revoke endpoint").await?;
        Ok(())
    }

    async fn latest_installer(
        &self,
        token: &str,
        platform_filter: &str,
    ) -> Result<ArtifactDescriptor> {
        let response = self
            .client
            .get(self.url(INSTALLERS_PATH))
            .bearer_auth(token)
            .query(&[
                ("filter", platform_filter),
                ("limit", "1"),
                ("sort", "version|desc"),
            ])
            .send()
            .await
            .context("installer lookup request failed")?;
        let response = ensure_success(response, "installer catalog").await?;
        let body: Envelope<InstallerResource> = response
            .json()
            .await
            .context("installer catalog response is not valid JSON")?;
        if let Some(errors) = describe_errors(body.errors.as_deref()) {
            anyhow::bail!("installer catalog reported errors: {errors}");
        }
        let first = body
            .resources
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("installer catalog returned no installers"))?;
        ArtifactDescriptor::new(&first.name, &first.sha256).ok_or_else(|| {
            anyhow::anyhow!("installer catalog entry is missing its name or sha256")
        })
    }

    async fn download_installer(
        &self,
        token: &str,
        sha256: &str,
        dest: &Path,
    ) -> Result<DownloadReport> {
        let mut response = self
            .client
            .get(self.url(DOWNLOAD_PATH))
            .bearer_auth(token)
            .query(&[("id", sha256)])
            .send()
            .await
            .context("download request failed")?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        if status != 200 {
            return Ok(DownloadReport {
                status,
                bytes_written: 0,
                content_length,
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("creating {}", dest.display()))?;
        let mut bytes_written = 0u64;
        while let Some(chunk) = response.chunk().await.context("reading download body")? {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("writing {}", dest.display()))?;
            bytes_written += chunk.len() as u64;
        }
        file.flush()
            .await
            .with_context(|| format!("flushing {}", dest.display()))?;

        Ok(DownloadReport {
            status,
            bytes_written,
            content_length,
        })
    }

    async fn reveal_uninstall_token(&self, token: &str, device_id: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url(UNINSTALL_TOKEN_PATH))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "audit_message": UNINSTALL_AUDIT_MESSAGE,
                "device_id": device_id,
            }))
            .send()
            .await
            .context("maintenance token request failed")?;
        let response = ensure_success(response, "maintenance token endpoint").await?;
        let body: Envelope<UninstallTokenResource> = response
            .json()
            .await
            .context("maintenance token response is not valid JSON")?;
        if let Some(errors) = describe_errors(body.errors.as_deref()) {
            anyhow::bail!("maintenance token endpoint reported errors: {errors}");
        }
        body.resources
            .into_iter()
            .map(|r| r.uninstall_token)
            .find(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("maintenance token endpoint returned no token"))
    }
}
