//! Configuration management for ocaportal using the prefer crate.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default width assumed for chart containers when the page sends none.
pub const DEFAULT_CHART_WIDTH_PX: u32 = 860;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (layout preference lives here).
    pub data_dir: PathBuf,
    /// Root URL of the portal serving the aggregation endpoints.
    pub base_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// CSRF token forwarded as `X-CSRFToken` on POST requests.
    pub csrf_token: Option<String>,
    /// Address the service binds to.
    pub host: String,
    pub port: u16,
    /// Container width used for title wrapping.
    pub chart_width_px: u32,
    /// Data source used when a request names none.
    pub default_data_source: String,
    /// Path of the journal timeseries endpoint, relative to `base_url`.
    pub journal_timeseries_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/ocaportal/ for user data
        let data_dir = dirs::document_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ocaportal");

        Self {
            data_dir,
            base_url: "http://localhost:8000".to_string(),
            user_agent: format!("ocaportal/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 30,
            csrf_token: None,
            host: "127.0.0.1".to_string(),
            port: 3030,
            chart_width_px: DEFAULT_CHART_WIDTH_PX,
            default_data_source: "scielo".to_string(),
            journal_timeseries_path: "/indicators/journal-metrics/timeseries/".to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// File holding the persisted layout preference.
    pub fn preference_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub chart_width_px: Option<u32>,
    #[serde(default)]
    pub default_data_source: Option<String>,
    #[serde(default)]
    pub journal_timeseries_path: Option<String>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers ocaportal config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ocaportal").await {
            Ok(pref_config) => Config {
                target: pref_config.get("target").ok(),
                base_url: pref_config.get("base_url").ok(),
                user_agent: pref_config.get("user_agent").ok(),
                request_timeout: pref_config.get("request_timeout").ok(),
                csrf_token: pref_config.get("csrf_token").ok(),
                host: pref_config.get("host").ok(),
                port: pref_config.get("port").ok(),
                chart_width_px: pref_config.get("chart_width_px").ok(),
                default_data_source: pref_config.get("default_data_source").ok(),
                journal_timeseries_path: pref_config.get("journal_timeseries_path").ok(),
            },
            Err(e) => {
                tracing::debug!("No ocaportal config file loaded: {}", e);
                Self::default()
            }
        }
    }

    /// Values from `OCA_*` environment variables (after `.env` is loaded).
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Config {
            target: var("OCA_DATA_DIR"),
            base_url: var("OCA_BASE_URL"),
            user_agent: var("OCA_USER_AGENT"),
            request_timeout: var("OCA_REQUEST_TIMEOUT").and_then(|v| v.parse().ok()),
            csrf_token: var("OCA_CSRF_TOKEN"),
            host: var("OCA_HOST"),
            port: var("OCA_PORT").and_then(|v| v.parse().ok()),
            chart_width_px: var("OCA_CHART_WIDTH_PX").and_then(|v| v.parse().ok()),
            default_data_source: var("OCA_DATA_SOURCE"),
            journal_timeseries_path: var("OCA_JOURNAL_TIMESERIES_PATH"),
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref target) = self.target {
            let path = shellexpand::tilde(target);
            settings.data_dir = PathBuf::from(path.as_ref());
        }
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref token) = self.csrf_token {
            settings.csrf_token = Some(token.clone());
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(width) = self.chart_width_px {
            settings.chart_width_px = width;
        }
        if let Some(ref source) = self.default_data_source {
            settings.default_data_source = source.clone();
        }
        if let Some(ref path) = self.journal_timeseries_path {
            settings.journal_timeseries_path = path.clone();
        }
    }
}

/// Load settings: defaults, then the config file, then the environment.
pub async fn load_settings() -> Settings {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    let mut settings = Settings::default();
    Config::load().await.apply_to_settings(&mut settings);
    Config::from_env().apply_to_settings(&mut settings);
    settings
}
