//! Configuration for l1data
//!
//! Centralized configuration with sensible defaults. A settings file in the
//! native database format can seed it; command-line flags override that.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};
use crate::storage::native::{self, NativeEntry};

/// Main configuration for an l1data instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Host or IP to listen on
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Number of slots allocated at startup
    pub capacity: usize,

    /// Upper bound for growth; `None` grows without limit
    pub max_capacity: Option<usize>,

    /// Directory that save/load paths sent over the wire are resolved against
    pub database_root: PathBuf,

    // -------------------------------------------------------------------------
    // Access Configuration
    // -------------------------------------------------------------------------
    /// Only `login` and `close` are served until a client authenticates
    pub require_auth: bool,

    /// Credential file: `username, role, hexhash, salt` per line
    pub users_file: PathBuf,

    /// Static list of admitted IP addresses
    pub whitelist_file: PathBuf,

    /// Banned IP addresses, appended to at runtime
    pub blacklist_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2000,
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            capacity: 10_000,
            max_capacity: None,
            database_root: PathBuf::from("."),
            require_auth: false,
            users_file: PathBuf::from("config/users.config"),
            whitelist_file: PathBuf::from("config/whitelist.config"),
            blacklist_file: PathBuf::from("config/blacklist.config"),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` as passed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Read a settings file written in the native database format
    ///
    /// Recognised keys: `host`, `port`, `database-root`, `tls`, `auth`,
    /// `capacity`. Anything else is ignored. `tls "tls=on"` predates the
    /// `auth` key and still switches authentication on.
    pub fn from_settings(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            DataError::Config(format!("cannot open settings file {}: {}", path.display(), e))
        })?;
        let entries = native::entries(BufReader::new(file)).collect::<Result<Vec<_>>>()?;
        let setting = |key: &str| -> Option<&str> {
            entries
                .iter()
                .find(|entry: &&NativeEntry| entry.key == key)
                .map(|entry| entry.value.as_str())
        };

        let mut config = Config::default();

        match setting("host") {
            Some(host) => config.host = host.to_string(),
            None => tracing::warn!("settings: no ':host', using {}", config.host),
        }
        match setting("port") {
            Some(port) => {
                config.port = port
                    .parse()
                    .map_err(|_| DataError::Config(format!("invalid port: {}", port)))?;
            }
            None => tracing::warn!("settings: no ':port', using {}", config.port),
        }
        match setting("database-root") {
            Some(root) => config.database_root = PathBuf::from(root),
            None => tracing::warn!("settings: no ':database-root', using current directory"),
        }
        if let Some(capacity) = setting("capacity") {
            config.capacity = capacity
                .parse()
                .map_err(|_| DataError::Config(format!("invalid capacity: {}", capacity)))?;
        }

        config.require_auth = setting("tls") == Some("tls=on") || setting("auth") == Some("on");

        tracing::debug!(
            "settings loaded from {}: listen={} auth={}",
            path.display(),
            config.listen_addr(),
            config.require_auth
        );
        Ok(config)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the listen host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the listen port (0 lets the OS pick one)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the initial number of slots
    pub fn capacity(mut self, slots: usize) -> Self {
        self.config.capacity = slots;
        self
    }

    /// Cap table growth at `slots`
    pub fn max_capacity(mut self, slots: usize) -> Self {
        self.config.max_capacity = Some(slots);
        self
    }

    /// Set the directory for wire-supplied file names
    pub fn database_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_root = path.into();
        self
    }

    pub fn require_auth(mut self, required: bool) -> Self {
        self.config.require_auth = required;
        self
    }

    pub fn users_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.users_file = path.into();
        self
    }

    pub fn whitelist_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.whitelist_file = path.into();
        self
    }

    pub fn blacklist_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.blacklist_file = path.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
