use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub storage_path: PathBuf,
    pub notification_poll_interval: Duration,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = env::var("API_BASE_URL").context("API_BASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let storage_path = env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storefront-storage.json"));
        let poll_secs = env::var("NOTIFICATION_POLL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(30);
        let timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        Ok(Self {
            api_base_url,
            host,
            port,
            storage_path,
            notification_poll_interval: Duration::from_secs(poll_secs),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
