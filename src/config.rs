//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "medidash", version, about = "Terminal dashboard for the hospital administration API")]
pub struct Config {
    /// Base URL of the hospital REST API.
    #[arg(long, env = "MEDIDASH_API_URL", default_value = "http://localhost:5000/api")]
    pub api_url: String,

    /// SQLite file holding the signed-in session.
    #[arg(long, env = "MEDIDASH_SESSION_DB", default_value = "medidash.db")]
    pub session_db: PathBuf,

    /// Where log output goes. The terminal is reserved for the UI.
    #[arg(long, env = "MEDIDASH_LOG_FILE", default_value = "medidash.log")]
    pub log_file: PathBuf,

    /// Per-request timeout in seconds. 0 disables it.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Seconds between payment status checks.
    #[arg(long, default_value_t = 5)]
    pub payment_poll_secs: u64,

    /// Give up on an unconfirmed payment after this many seconds.
    #[arg(long, default_value_t = 600)]
    pub payment_timeout_secs: u64,
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn payment_poll_interval(&self) -> Duration {
        Duration::from_secs(self.payment_poll_secs.max(1))
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            session_db: PathBuf::from("medidash.db"),
            log_file: PathBuf::from("medidash.log"),
            request_timeout_secs: 30,
            payment_poll_secs: 5,
            payment_timeout_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "medidash",
            "--api-url",
            "https://hospital.example/api",
            "--request-timeout-secs",
            "0",
            "--payment-poll-secs",
            "0",
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://hospital.example/api");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.payment_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.payment_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
