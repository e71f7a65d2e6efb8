use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CredcheckError;

pub const DEFAULT_BACKEND_BASE_URL: &str = "https://api.fakesniper.com";
pub const DEFAULT_USER_AGENT: &str = "FakeSniper-Frontend/1.0";

/// Proxy server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    // Analysis backend
    pub backend_base_url: String,
    pub backend_timeout: Duration,
    pub health_timeout: Duration,
    pub user_agent: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, CredcheckError> {
        dotenvy::dotenv().ok();

        let config = Self {
            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            backend_timeout: Duration::from_secs(parsed_env("BACKEND_TIMEOUT_SECS", 30)?),
            health_timeout: Duration::from_secs(parsed_env("HEALTH_TIMEOUT_SECS", 5)?),
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000)?,
        };

        tracing::info!("Proxy config loaded:");
        tracing::info!("  BACKEND_BASE_URL: {}", config.backend_base_url);
        tracing::info!("  BACKEND_TIMEOUT_SECS: {}", config.backend_timeout.as_secs());
        tracing::info!("  WEB: {}:{}", config.web_host, config.web_port);
        Ok(config)
    }

    /// Full upstream URL for a backend endpoint path such as `/get_score`.
    pub fn backend_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.backend_base_url, endpoint)
    }
}

/// Terminal client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub timeout: Duration,
    pub history_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, CredcheckError> {
        dotenvy::dotenv().ok();

        let history_path = match env::var("CREDCHECK_HISTORY_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => home_dir().join(".credcheck").join("recent.json"),
        };

        let config = Self {
            proxy_url: env::var("CREDCHECK_PROXY_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parsed_env("CREDCHECK_TIMEOUT_SECS", 30)?),
            history_path,
        };

        tracing::debug!(
            proxy_url = config.proxy_url.as_str(),
            history_path = %config.history_path.display(),
            "Client config loaded"
        );
        Ok(config)
    }
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, CredcheckError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CredcheckError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
