use std::path::PathBuf;
use std::time::Duration;

use lexis_algo::AccuracyBlend;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CLEAR_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub user_id: String,
    pub clear_delay: Duration,
    pub accuracy_blend: AccuracyBlend,
    pub seed: Option<u64>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            data_dir: PathBuf::from("./data"),
            user_id: "local".to_string(),
            clear_delay: Duration::from_millis(DEFAULT_CLEAR_DELAY_MS),
            accuracy_blend: AccuracyBlend::Legacy,
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env_string("LEXIS_API_URL").unwrap_or(defaults.api_url);
        let api_token = env_string("LEXIS_API_TOKEN");
        let request_timeout = env_u64("LEXIS_REQUEST_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        let data_dir = env_string("LEXIS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let user_id = env_string("LEXIS_USER_ID").unwrap_or(defaults.user_id);
        let clear_delay = env_u64("LEXIS_CLEAR_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.clear_delay);
        let accuracy_blend = env_string("LEXIS_ACCURACY_BLEND")
            .and_then(|value| value.parse::<AccuracyBlend>().ok())
            .unwrap_or(defaults.accuracy_blend);
        let seed = env_u64("LEXIS_SEED");
        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        Self {
            api_url,
            api_token,
            request_timeout,
            data_dir,
            user_id,
            clear_delay,
            accuracy_blend,
            seed,
            log_level,
        }
    }
}

pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.clear_delay, Duration::from_secs(3));
        assert_eq!(config.accuracy_blend, AccuracyBlend::Legacy);
        assert!(config.seed.is_none());
    }
}
