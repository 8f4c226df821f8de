//! Mux Video HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use vgen_models::{AssetId, AssetSnapshot, PlaybackId};
use vgen_tracker::{AssetStatusSource, CollaboratorError, PlaybackProvisioner};

use crate::error::{MuxError, MuxResult};
use crate::types::{
    CreateAssetRequest, CreatePlaybackIdRequest, DataEnvelope, MuxAsset, MuxPlaybackId,
};

/// Configuration for the Mux client.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// Base URL of the Mux API
    pub base_url: String,
    /// Access token id (basic auth user)
    pub token_id: String,
    /// Access token secret (basic auth password)
    pub token_secret: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for idempotent requests
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mux.com".to_string(),
            token_id: String::new(),
            token_secret: String::new(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl MuxConfig {
    /// Create config from environment variables.
    ///
    /// `MUX_TOKEN_ID` and `MUX_TOKEN_SECRET` are required.
    pub fn from_env() -> MuxResult<Self> {
        let token_id = std::env::var("MUX_TOKEN_ID")
            .map_err(|_| MuxError::config("MUX_TOKEN_ID is not set"))?;
        let token_secret = std::env::var("MUX_TOKEN_SECRET")
            .map_err(|_| MuxError::config("MUX_TOKEN_SECRET is not set"))?;

        Ok(Self {
            base_url: std::env::var("MUX_BASE_URL")
                .unwrap_or_else(|_| "https://api.mux.com".to_string()),
            token_id,
            token_secret,
            timeout: Duration::from_secs(
                std::env::var("MUX_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("MUX_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retry_base_delay: Duration::from_millis(500),
        })
    }

    pub fn new(
        base_url: impl Into<String>,
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_id: token_id.into(),
            token_secret: token_secret.into(),
            ..Default::default()
        }
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// Client for the Mux Video API.
pub struct MuxClient {
    http: Client,
    config: MuxConfig,
}

impl MuxClient {
    /// Create a new Mux client.
    pub fn new(config: MuxConfig) -> MuxResult<Self> {
        if config.token_id.is_empty() || config.token_secret.is_empty() {
            return Err(MuxError::config("Mux access token id and secret are required"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MuxError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MuxResult<Self> {
        Self::new(MuxConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.token_id, Some(&self.config.token_secret))
    }

    /// Retrieve an asset's current status.
    pub async fn retrieve_asset(&self, asset_id: &AssetId) -> MuxResult<AssetSnapshot> {
        let url = self.url(&format!("/video/v1/assets/{}", asset_id));
        debug!(asset_id = %asset_id, "Retrieving Mux asset");

        let asset: MuxAsset = self
            .with_retry(|| self.send(self.authorized(self.http.get(&url)), Some(asset_id)))
            .await?;

        Ok(asset.into())
    }

    /// Add a public playback id to an asset.
    pub async fn create_playback_id(&self, asset_id: &AssetId) -> MuxResult<PlaybackId> {
        let url = self.url(&format!("/video/v1/assets/{}/playback-ids", asset_id));
        let body = CreatePlaybackIdRequest::default();

        // Not retried: a repeated POST would add a second playback id.
        let playback: MuxPlaybackId = self
            .send(self.authorized(self.http.post(&url).json(&body)), Some(asset_id))
            .await?;

        info!(asset_id = %asset_id, playback_id = %playback.id, "Created Mux playback id");
        Ok(PlaybackId::from(playback.id))
    }

    /// Start ingesting a video from a public URL.
    pub async fn create_asset(&self, source_url: &str) -> MuxResult<AssetSnapshot> {
        let url = self.url("/video/v1/assets");
        let body = CreateAssetRequest::public_basic(source_url);

        // Not retried: a repeated POST would start a second ingest job.
        let asset: MuxAsset = self
            .send(self.authorized(self.http.post(&url).json(&body)), None)
            .await?;

        info!(asset_id = %asset.id, status = %asset.status, "Created Mux asset");
        Ok(asset.into())
    }

    /// Send a request and unwrap the `data` envelope.
    ///
    /// A 404 becomes `NotFound` only for requests addressing an existing
    /// asset; otherwise it is reported as a plain API error.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        asset_id: Option<&AssetId>,
    ) -> MuxResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if let (StatusCode::NOT_FOUND, Some(asset_id)) = (status, asset_id) {
            return Err(MuxError::NotFound(asset_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MuxError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: DataEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| MuxError::InvalidResponse(format!("unexpected Mux payload: {}", e)))?;
        Ok(envelope.data)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MuxResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MuxResult<T>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay.saturating_mul(2u32.pow(attempt));
                    attempt += 1;
                    warn!(
                        "Mux request failed (attempt {}), retrying in {:?}: {}",
                        attempt, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl AssetStatusSource for MuxClient {
    async fn fetch_status(&self, asset_id: &AssetId) -> Result<AssetSnapshot, CollaboratorError> {
        Ok(self.retrieve_asset(asset_id).await?)
    }
}

#[async_trait]
impl PlaybackProvisioner for MuxClient {
    /// Reuse an existing playback id if the asset has one.
    async fn ensure_playback_id(&self, asset_id: &AssetId) -> Result<PlaybackId, CollaboratorError> {
        let snapshot = self.retrieve_asset(asset_id).await?;
        if let Some(playback_id) = snapshot.playback_id {
            return Ok(playback_id);
        }
        Ok(self.create_playback_id(asset_id).await?)
    }
}
