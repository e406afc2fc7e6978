//! Configuration for the RabbitMQ exporter.
//!
//! Broker credentials come from the environment; everything else comes from
//! command-line flags and falls back to the defaults below.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the management API `host[:port]`.
pub const ENV_HOST: &str = "RABBITMQ_HOST";
/// Environment variable holding the management API user.
pub const ENV_USER: &str = "RABBITMQ_USER";
/// Environment variable holding the management API password.
pub const ENV_PASSWORD: &str = "RABBITMQ_PASSWORD";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variables {} must be set", .0.join(", "))]
    MissingEnv(Vec<&'static str>),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Broker management API connection.
    pub broker: BrokerConfig,

    /// Metrics HTTP endpoint settings.
    pub http: HttpConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Expected scrape interval in seconds.
    ///
    /// Informational only: collection runs on each scrape, so this is logged
    /// at startup for operators and never schedules anything.
    pub interval_secs: u64,
}

impl ExporterConfig {
    /// Build a configuration around the given broker settings.
    pub fn new(broker: BrokerConfig) -> Self {
        Self {
            broker,
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            interval_secs: default_interval_secs(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http.listen_addr()?;

        if !self.http.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.http.path == HEALTH_PATH {
            return Err(ConfigError::Validation(format!(
                "Metrics path must not be {}",
                HEALTH_PATH
            )));
        }

        if self.broker.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "Broker timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Path served by the liveness check.
pub(crate) const HEALTH_PATH: &str = "/health";

fn default_interval_secs() -> u64 {
    15
}

/// Broker management API connection settings.
#[derive(Clone)]
pub struct BrokerConfig {
    /// Management API `host[:port]`, also used as the `host` label.
    pub host: String,
    /// Basic auth user.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Client-side timeout for each management API call.
    pub timeout: Duration,
}

/// Default management API timeout.
pub const DEFAULT_BROKER_TIMEOUT: Duration = Duration::from_secs(10);

impl BrokerConfig {
    /// Create broker settings with the default timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_BROKER_TIMEOUT,
        }
    }

    /// Read broker settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read broker settings through `lookup`.
    ///
    /// Unset and empty variables are both treated as missing, and every
    /// missing name is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |key: &'static str| match lookup(key) {
            Some(value) if !value.is_empty() => value,
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let host = read(ENV_HOST);
        let username = read(ENV_USER);
        let password = read(ENV_PASSWORD);

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        Ok(Self::new(host, username, password))
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the queue listing endpoint.
    pub fn queues_url(&self) -> String {
        format!("http://{}/api/queues", self.host)
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Metrics HTTP endpoint configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Port to listen on, all interfaces (default: "8000").
    pub port: String,

    /// Path for metrics endpoint (default: "/metrics").
    pub path: String,
}

fn default_port() -> String {
    "8000".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl HttpConfig {
    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port: u16 = self
            .port
            .parse()
            .map_err(|_| ConfigError::Validation(format!("Invalid port: {}", self.port)))?;

        Ok(SocketAddr::from(([0, 0, 0, 0], port)))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,

    /// Log output format: "text" or "json".
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
