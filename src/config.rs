use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome!";
pub const DEFAULT_READY_MESSAGE: &str = "Ready for action: ";
pub const DEFAULT_ACCEPT_TIMEOUT_MS: u64 = 5000;

/// A single configuration setting, with its names in the supported sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Host,
    Port,
    WelcomeMessage,
    ReadyMessage,
    SocketTimeout,
    MaxSessions,
}

impl Key {
    pub fn env_var(self) -> &'static str {
        match self {
            Key::Host => "TELNET_SERVICE_HOST",
            Key::Port => "TELNET_SERVICE_PORT",
            Key::WelcomeMessage => "TELNET_SERVICE_MESSAGE_WELCOME",
            Key::ReadyMessage => "TELNET_SERVICE_MESSAGE_READY",
            Key::SocketTimeout => "TELNET_SERVICE_SOCKET_TIMEOUT",
            Key::MaxSessions => "TELNET_SERVICE_MAX_SESSIONS",
        }
    }

    pub fn file_key(self) -> &'static str {
        match self {
            Key::Host => "host",
            Key::Port => "port",
            Key::WelcomeMessage => "welcome_message",
            Key::ReadyMessage => "ready_message",
            Key::SocketTimeout => "accept_timeout_ms",
            Key::MaxSessions => "max_sessions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,            // e.g. "0.0.0.0"
    pub port: u16,               // e.g. 9999
    pub welcome_message: String, // handed to the banner on connect
    pub ready_message: String,   // written before every read
    pub accept_timeout_ms: u64,  // how often the accept loop re-checks the running flag
    /// Admission limit. `None` accepts any number of concurrent sessions.
    pub max_sessions: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            ready_message: DEFAULT_READY_MESSAGE.to_string(),
            accept_timeout_ms: DEFAULT_ACCEPT_TIMEOUT_MS,
            max_sessions: None,
        }
    }
}

impl Config {
    /// Load settings from a TOML file. Missing or malformed settings fall back
    /// to their defaults; only an unreadable or unparsable file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table: toml::Table = toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_lookup(|key| {
            table.get(key.file_key()).map(|v| match v {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }))
    }

    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key.env_var()).ok())
    }

    /// Resolve every setting through `lookup`, falling back to the default
    /// for anything absent or malformed.
    pub fn from_lookup(lookup: impl Fn(Key) -> Option<String>) -> Self {
        let defaults = Self::default();

        let accept_timeout_ms = match parse_or(Key::SocketTimeout, lookup(Key::SocketTimeout), defaults.accept_timeout_ms) {
            0 => {
                tracing::warn!(key = Key::SocketTimeout.env_var(), "socket timeout must be positive, using default");
                defaults.accept_timeout_ms
            }
            ms => ms,
        };

        let max_sessions = match parse_or(Key::MaxSessions, lookup(Key::MaxSessions), 0usize) {
            0 => None,
            n => Some(n),
        };

        Self {
            host: lookup(Key::Host).filter(|h| !h.trim().is_empty()).unwrap_or(defaults.host),
            port: parse_or(Key::Port, lookup(Key::Port), defaults.port),
            welcome_message: lookup(Key::WelcomeMessage).unwrap_or(defaults.welcome_message),
            ready_message: lookup(Key::ReadyMessage).unwrap_or(defaults.ready_message),
            accept_timeout_ms,
            max_sessions,
        }
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms.max(1))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: Key, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key = key.env_var(), value = %raw, "error parsing configuration value, using default");
            default
        }
    }
}
