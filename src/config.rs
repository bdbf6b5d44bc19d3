use std::env;
use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub realtime_url: String,
    pub session_file: PathBuf,
    pub page_size: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = env_or("FEEDSYNC_API_URL", "http://localhost:4000/api")
            .trim_end_matches('/')
            .to_string();
        let realtime_url = env_or("FEEDSYNC_REALTIME_URL", "ws://localhost:4000/realtime");
        let data_dir = env::var("FEEDSYNC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let page_size = match env::var("FEEDSYNC_PAGE_SIZE") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                warn!("invalid FEEDSYNC_PAGE_SIZE '{v}': {e}, using 10");
                10
            }),
            Err(_) => 10,
        };
        Config {
            api_url,
            realtime_url,
            session_file: data_dir.join("session.json"),
            page_size,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    })
}
