use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Shared HTTP client for hosting API requests (connection pooling + timeout).
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build netlify client")
    })
}

/// Deployment lifecycle state as reported by the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    New,
    Uploading,
    Ready,
    Current,
    Error,
    Other(String),
}

impl DeployState {
    pub fn parse(s: &str) -> Self {
        match s {
            "new" => DeployState::New,
            "uploading" => DeployState::Uploading,
            "ready" => DeployState::Ready,
            "current" => DeployState::Current,
            "error" => DeployState::Error,
            other => DeployState::Other(other.to_string()),
        }
    }

    /// The deploy is serving traffic.
    pub fn is_live(&self) -> bool {
        matches!(self, DeployState::Ready | DeployState::Current)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeployState::Error)
    }
}

/// A hosting site. Created lazily on the first publish; the id is then
/// reused by the caller for republishes of the same logical site.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: String,
    pub name: String,
    /// Provisional public URL, known as soon as the site exists.
    pub url: String,
}

/// One deployment of a site. Ephemeral; observed via polling, never stored.
#[derive(Debug, Clone)]
pub struct Deploy {
    pub id: String,
    pub state: DeployState,
    /// Digests the provider does not already have; only these need uploading.
    pub required: Vec<String>,
    /// Live URL, present once the deploy settles. May differ from the site's
    /// provisional URL.
    pub live_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum CreateSiteError {
    /// The requested name is already taken on the provider.
    #[error("site name is already taken")]
    NameTaken,
    #[error("hosting provider rejected site creation ({status}): {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// The subset of the hosting provider's API the publish protocol needs.
#[async_trait]
pub trait HostingProvider {
    async fn create_site(&self, name: &str) -> Result<Site, CreateSiteError>;

    async fn get_site(&self, site_id: &str) -> Result<Site>;

    /// Open a deploy whose manifest maps `path` to its SHA-1 digest. The
    /// returned deploy lists which digests still need uploading.
    async fn create_deploy(&self, site_id: &str, path: &str, sha1_hex: &str) -> Result<Deploy>;

    /// Upload the raw bytes for one file of a pending deploy.
    async fn upload_file(&self, deploy_id: &str, path: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get_deploy(&self, deploy_id: &str) -> Result<Deploy>;
}

#[derive(Debug, Deserialize)]
struct SiteBody {
    id: String,
    name: String,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl SiteBody {
    fn into_site(self) -> Site {
        let url = self
            .ssl_url
            .or(self.url)
            .unwrap_or_else(|| format!("https://{}.netlify.app", self.name));
        Site {
            id: self.id,
            name: self.name,
            url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeployBody {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    deploy_ssl_url: Option<String>,
}

impl DeployBody {
    fn into_deploy(self) -> Deploy {
        Deploy {
            id: self.id,
            state: DeployState::parse(&self.state),
            required: self.required,
            live_url: self.ssl_url.or(self.deploy_ssl_url),
        }
    }
}

/// Client for Netlify's sites/deploys REST API.
pub struct NetlifyClient {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl NetlifyClient {
    /// Returns `None` when the Netlify token is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            api_base: config.netlify_api_base.clone(),
            token: config.netlify_token.clone()?,
            client: http_client().clone(),
        })
    }
}

#[async_trait]
impl HostingProvider for NetlifyClient {
    async fn create_site(&self, name: &str) -> Result<Site, CreateSiteError> {
        let response = self
            .client
            .post(format!("{}/sites", self.api_base))
            .bearer_auth(&self.token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| anyhow::Error::new(e).context("Failed to reach hosting provider"))?;

        let status = response.status();
        if status.is_success() {
            let body: SiteBody = response
                .json()
                .await
                .map_err(|e| anyhow::Error::new(e).context("Failed to parse site response"))?;
            return Ok(body.into_site());
        }

        // 422 is the provider's uniqueness rejection for the requested name.
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Err(CreateSiteError::NameTaken);
        }

        let message = response.text().await.unwrap_or_default();
        Err(CreateSiteError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_site(&self, site_id: &str) -> Result<Site> {
        let response = self
            .client
            .get(format!("{}/sites/{}", self.api_base, site_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach hosting provider")?;

        if !response.status().is_success() {
            bail!("Site lookup failed ({})", response.status());
        }

        let body: SiteBody = response
            .json()
            .await
            .context("Failed to parse site response")?;
        Ok(body.into_site())
    }

    async fn create_deploy(&self, site_id: &str, path: &str, sha1_hex: &str) -> Result<Deploy> {
        let response = self
            .client
            .post(format!("{}/sites/{}/deploys", self.api_base, site_id))
            .bearer_auth(&self.token)
            .json(&json!({ "files": { path: sha1_hex }, "async": false }))
            .send()
            .await
            .context("Failed to reach hosting provider")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Deploy init failed: {}", text);
        }

        let body: DeployBody = response
            .json()
            .await
            .context("Failed to parse deploy response")?;
        Ok(body.into_deploy())
    }

    async fn upload_file(&self, deploy_id: &str, path: &str, bytes: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(format!(
                "{}/deploys/{}/files/{}",
                self.api_base,
                deploy_id,
                path.trim_start_matches('/')
            ))
            .bearer_auth(&self.token)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .context("Failed to reach hosting provider")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Upload failed: {}", text);
        }
        Ok(())
    }

    async fn get_deploy(&self, deploy_id: &str) -> Result<Deploy> {
        let response = self
            .client
            .get(format!("{}/deploys/{}", self.api_base, deploy_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach hosting provider")?;

        if !response.status().is_success() {
            bail!("Deploy status fetch failed ({})", response.status());
        }

        let body: DeployBody = response
            .json()
            .await
            .context("Failed to parse deploy response")?;
        Ok(body.into_deploy())
    }
}
