use std::env;
use std::time::Duration;

pub struct Config {
    pub host: String,
    pub port: String,
    /// Upper bound for connecting to a vehicle and for each delivery.
    pub notify_timeout: Duration,
}

impl Config {
    pub fn init() -> Config {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let notify_timeout = Duration::from_secs(env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5));
        Config {
            host,
            port,
            notify_timeout,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
