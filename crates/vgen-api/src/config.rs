//! API configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use vgen_tracker::{PollConfig, TrackerConfig};

/// How `POST /api/assets/:asset_id/wait` learns that an asset is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessMode {
    /// Wait on the in-memory broker fed by `POST /api/mux-webhook`.
    Webhook,
    /// Poll the Mux API until a terminal status.
    Polling,
}

impl ReadinessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessMode::Webhook => "webhook",
            ReadinessMode::Polling => "polling",
        }
    }
}

impl fmt::Display for ReadinessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadinessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "webhook" | "webhooks" => Ok(ReadinessMode::Webhook),
            "polling" | "poll" => Ok(ReadinessMode::Polling),
            other => Err(format!("unknown readiness mode: {}", other)),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Webhook broker or polling fallback
    pub readiness_mode: ReadinessMode,
    /// Mux webhook signing secret
    pub mux_webhook_secret: Option<String>,
    /// Accepted clock skew for webhook signatures
    pub webhook_tolerance: Duration,
    /// Upper bound on a caller-supplied wait timeout
    pub max_wait_timeout: Duration,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    pub tracker: TrackerConfig,
    pub poll: PollConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            readiness_mode: ReadinessMode::Polling,
            mux_webhook_secret: None,
            webhook_tolerance: Duration::from_secs(300),
            max_wait_timeout: Duration::from_secs(600),
            metrics_enabled: true,
            tracker: TrackerConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Without an explicit `READINESS_MODE`, the webhook broker is used when
    /// a signing secret is configured and polling otherwise.
    pub fn from_env() -> Self {
        let mux_webhook_secret = std::env::var("MUX_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let readiness_mode = std::env::var("READINESS_MODE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if mux_webhook_secret.is_some() {
                ReadinessMode::Webhook
            } else {
                ReadinessMode::Polling
            });

        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            readiness_mode,
            mux_webhook_secret,
            webhook_tolerance: Duration::from_secs(
                std::env::var("MUX_WEBHOOK_TOLERANCE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_wait_timeout: Duration::from_secs(
                std::env::var("MAX_WAIT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            tracker: TrackerConfig::from_env(),
            poll: PollConfig::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.mux_webhook_secret = Some(secret.into());
        self
    }

    pub fn with_readiness_mode(mut self, mode: ReadinessMode) -> Self {
        self.readiness_mode = mode;
        self
    }
}
