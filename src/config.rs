use std::time::Duration;

use crate::error::{Result, TranslateError};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_REFERRER: &str = "http://localhost:3000/";
pub const DEFAULT_APP_NAME: &str = "Simple AI powered Translator";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    /// Sent as HTTP-Referer for backend-side attribution.
    pub referrer: String,
    /// Sent as X-Title for backend-side attribution.
    pub app_name: String,
    pub bind_addr: String,
    /// Minimum pause between consecutive backend requests within one job.
    pub request_interval: Duration,
}

impl Config {
    /// Reads configuration from the environment. A missing API key is a hard
    /// error so the service refuses to start rather than failing per-chunk.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TranslateError::Config("OPENROUTER_API_KEY is not set".to_string())
            })?;

        let api_url =
            std::env::var("OPENROUTER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let referrer =
            std::env::var("FANYI_REFERRER").unwrap_or_else(|_| DEFAULT_REFERRER.to_string());
        let app_name =
            std::env::var("FANYI_APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.to_string());
        let bind_addr =
            std::env::var("FANYI_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let interval_ms = std::env::var("FANYI_REQUEST_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_INTERVAL_MS);

        Ok(Config {
            api_key,
            api_url,
            referrer,
            app_name,
            bind_addr,
            request_interval: Duration::from_millis(interval_ms),
        })
    }
}
