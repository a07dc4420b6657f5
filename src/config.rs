use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub graph_path: PathBuf,
    pub prefs_path: PathBuf,
    pub remote_base_url: Option<String>,
    pub request_timeout_ms: u64,
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

        let file_logs_enabled = std::env::var("ENABLE_FILE_LOGS")
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);
        let log_dir = file_logs_enabled.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./logs"))
        });

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let graph_path = std::env::var("GRAPH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&data_dir).join("graph.json"));

        let prefs_path = std::env::var("PREFS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&data_dir).join("preferences.json"));

        let remote_base_url = std::env::var("REMOTE_GRAPH_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let request_timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10_000);

        Self {
            host,
            port,
            log_level,
            log_dir,
            graph_path,
            prefs_path,
            remote_base_url,
            request_timeout_ms,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
