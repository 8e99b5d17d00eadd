use std::{fmt::Display, str::FromStr};

use crate::errors::AppError;

pub const DEFAULT_TABLE_NAME: &str = "creator-ratings";
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;
pub const MAX_SCAN_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub stage: String,
    pub region: String,
    /// Namespace for every stored key.
    pub table_name: String,
    pub store_backend: StoreBackend,
    pub redis_url: Option<String>,
    pub youtube_api_key: Option<String>,
    pub scan_page_size: usize,
    pub extra_allowed_email_domains: Vec<String>,
    pub extra_blocked_email_domains: Vec<String>,
    // Take the client address from X-Forwarded-For. Only safe behind a
    // proxy that appends the peer address itself.
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            stage: "dev".into(),
            region: "local".into(),
            table_name: DEFAULT_TABLE_NAME.into(),
            store_backend: StoreBackend::Redis,
            redis_url: None,
            youtube_api_key: None,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            extra_allowed_email_domains: Vec::new(),
            extra_blocked_email_domains: Vec::new(),
            trust_proxy: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let store_backend =
            parse_or(var("STORE_BACKEND"), "STORE_BACKEND", defaults.store_backend)?;
        let redis_url = var("REDIS_URL");
        if store_backend == StoreBackend::Redis && redis_url.is_none() {
            return Err(AppError::EnvError(
                "REDIS_URL must be set when STORE_BACKEND=redis".into(),
            ));
        }

        let scan_page_size: usize =
            parse_or(var("SCAN_PAGE_SIZE"), "SCAN_PAGE_SIZE", defaults.scan_page_size)?;

        let youtube_api_key = var("YOUTUBE_API_KEY");
        if youtube_api_key.is_none() {
            tracing::warn!("YOUTUBE_API_KEY not set, /search will be unavailable");
        }

        let trust_proxy = parse_or(var("TRUST_PROXY"), "TRUST_PROXY", defaults.trust_proxy)?;
        if trust_proxy {
            tracing::info!("TRUST_PROXY set, client IPs taken from X-Forwarded-For");
        }

        Ok(Self {
            port: parse_or(var("PORT"), "PORT", defaults.port)?,
            stage: var("STAGE").unwrap_or(defaults.stage),
            region: var("REGION").unwrap_or(defaults.region),
            table_name: var("RATINGS_TABLE").unwrap_or(defaults.table_name),
            store_backend,
            redis_url,
            youtube_api_key,
            scan_page_size: scan_page_size.clamp(1, MAX_SCAN_PAGE_SIZE),
            extra_allowed_email_domains: split_list(var("EXTRA_ALLOWED_EMAIL_DOMAINS")),
            extra_blocked_email_domains: split_list(var("EXTRA_BLOCKED_EMAIL_DOMAINS")),
            trust_proxy,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|e| AppError::EnvError(format!("Invalid {key} value '{value}': {e}"))),
        None => Ok(default),
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
