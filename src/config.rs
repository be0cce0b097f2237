use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DEBOUNCE_SECS: u64 = 120;
const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CLASSIFIER_BASE_URL: &str = "http://127.0.0.1:3000";
const STORE_DIR_NAME: &str = "adaptive-learning";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Filter level for `adaptive_learning_backend::recorder` events.
    pub recorder_log_level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
    pub llm_enabled: bool,
    pub llm_mock: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let recorder_log_level = std::env::var("RECORDER_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let file_logs = env_bool("ENABLE_FILE_LOGS").unwrap_or(false);
        let log_dir = std::env::var("LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./logs"));
        let llm_enabled = env_bool("LLM_ENABLED").unwrap_or(true);
        let llm_mock = env_bool("LLM_MOCK").unwrap_or(false);

        Self {
            host,
            port,
            log_level,
            recorder_log_level,
            file_logs,
            log_dir,
            llm_enabled,
            llm_mock,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Settings for the client-side interaction recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub debounce_window: Duration,
    pub classifier_base_url: String,
    /// Upper bound for one classification round trip.
    pub request_timeout: Duration,
    pub store_dir: PathBuf,
}

impl RecorderConfig {
    pub fn from_env() -> Self {
        let debounce_window = std::env::var("PREFERENCE_DEBOUNCE_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_DEBOUNCE_SECS));

        let classifier_base_url = std::env::var("CLASSIFIER_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_BASE_URL.to_string());

        let request_timeout = std::env::var("CLASSIFIER_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS));

        let store_dir = std::env::var("INTERACTION_STORE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_store_dir);

        Self {
            debounce_window,
            classifier_base_url,
            request_timeout,
            store_dir,
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_secs(DEFAULT_DEBOUNCE_SECS),
            classifier_base_url: DEFAULT_CLASSIFIER_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS),
            store_dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(STORE_DIR_NAME)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
