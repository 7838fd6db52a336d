use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "GEOPULSE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_PAUSE_POLL_SECONDS: u64 = 5;

/// Scan execution tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Re-poll cadence while a scan is paused, in seconds
    #[serde(default = "default_pause_poll_seconds")]
    pub pause_poll_seconds: u64,
}

fn default_pause_poll_seconds() -> u64 {
    DEFAULT_PAUSE_POLL_SECONDS
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pause_poll_seconds: DEFAULT_PAUSE_POLL_SECONDS,
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub scan: ScanConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let scan = Self::load_config_file(&config_path)
            .map(|cf| cf.scan)
            .unwrap_or_default();

        Self { scan, port, host }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
