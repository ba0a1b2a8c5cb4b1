//! Service configuration.
//!
//! Built once at startup from environment variables and passed explicitly to
//! the components that need it.

use std::time::Duration;

use thiserror::Error;

/// Identity of this service; used as `source` on every outbound event.
pub const SERVICE_NAME: &str = "k6-service";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PATH: &str = "/";
const DEFAULT_EVENT_BROKER_URL: &str = "http://localhost:8081/event";
const DEFAULT_ACTION_DURATION_SECS: u64 = 5;
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 300;

/// Routes served by the probe endpoints; the receiver cannot share them.
const RESERVED_PATHS: [&str; 2] = ["/health", "/ready"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Where the service is running.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development: resources come from the local filesystem, logs are human readable.
    #[default]
    Local,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("local") {
            Self::Local
        } else {
            Self::Production
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Runtime configuration of the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Source identity stamped on outbound events.
    pub service_name: String,
    /// Port on which to listen for CloudEvents.
    pub port: u16,
    /// Path to which CloudEvents are posted.
    pub path: String,
    pub env: Environment,
    /// URL of the configuration service (resource lookup), if any.
    pub configuration_service_url: Option<String>,
    /// Where outbound events are posted.
    pub event_broker_url: String,
    /// Length of the placeholder test action.
    pub action_duration: Duration,
    /// Upper bound on a single task action.
    pub action_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            env: Environment::Local,
            configuration_service_url: None,
            event_broker_url: DEFAULT_EVENT_BROKER_URL.to_string(),
            action_duration: Duration::from_secs(DEFAULT_ACTION_DURATION_SECS),
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("RCV_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "RCV_PORT",
                message: e.to_string(),
            })?,
            None => defaults.port,
        };

        let path = get("RCV_PATH").unwrap_or(defaults.path);
        if !path.starts_with('/') {
            return Err(ConfigError::Invalid {
                var: "RCV_PATH",
                message: format!("path must start with '/', got {path:?}"),
            });
        }
        if RESERVED_PATHS.contains(&path.as_str()) {
            return Err(ConfigError::Invalid {
                var: "RCV_PATH",
                message: format!("{path} is reserved for probes"),
            });
        }
        if path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(ConfigError::Invalid {
                var: "RCV_PATH",
                message: format!("{path} must be a literal path, without ':' or '*' segments"),
            });
        }

        let env = get("ENV")
            .map(|raw| Environment::parse(&raw))
            .unwrap_or(defaults.env);

        Ok(Self {
            service_name: defaults.service_name,
            port,
            path,
            env,
            configuration_service_url: get("CONFIGURATION_SERVICE"),
            event_broker_url: get("EVENTBROKER").unwrap_or(defaults.event_broker_url),
            action_duration: secs(&get, "ACTION_DURATION_SECS", defaults.action_duration)?,
            action_timeout: secs(&get, "ACTION_TIMEOUT_SECS", defaults.action_timeout)?,
        })
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_action_duration(mut self, duration: Duration) -> Self {
        self.action_duration = duration;
        self
    }
}

fn secs(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                var,
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}
