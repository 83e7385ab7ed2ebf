use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::rate_limit_config::RateLimitConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "product-catalog", version, about = "Products CRUD API")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Environment label reported in logs and health checks
    #[arg(long, env = "ENV", default_value = "development")]
    pub env: String,

    /// Default log level for this crate
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable per-client rate limiting
    #[arg(
        long,
        env = "RATE_LIMIT_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub rate_limit_enabled: bool,

    /// Requests admitted per client per window
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 20)]
    pub rate_limit_requests: u64,

    /// Rate limit window, e.g. "5s" or "1m"
    #[arg(long, env = "RATE_LIMIT_WINDOW", default_value = "5s", value_parser = humantime::parse_duration)]
    pub rate_limit_window: Duration,

    /// Per-request timeout
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "60s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// Grace period for in-flight requests on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load configuration from command line arguments and the environment
    pub fn from_env() -> Result<Self, clap::Error> {
        Config::try_parse()
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            enabled: self.rate_limit_enabled,
            requests_per_window: self.rate_limit_requests,
            window: self.rate_limit_window,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let rate_limit = RateLimitConfig::default();
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            env: "development".to_string(),
            log_level: "info".to_string(),
            rate_limit_enabled: rate_limit.enabled,
            rate_limit_requests: rate_limit.requests_per_window,
            rate_limit_window: rate_limit.window,
            request_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
