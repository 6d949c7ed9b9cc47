use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `database.uri`
pub const DATABASE_URI_ENV: &str = "DATABASE_URI";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_uri")]
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccountConfig {
    /// Refresh the derived hex color on red and green updates too, not only on blue.
    #[serde(default)]
    pub recompute_color_on_any_channel: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

/// Where the user table lives, resolved from `database.uri`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

// Default value functions
fn default_port() -> u16 {
    5000
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_database_uri() -> String {
    "sqlite:///guestbook.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: Some(default_port()),
            unix_socket: None,
            num_threads: default_num_threads(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_database_uri(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection string into a SQLite target.
    ///
    /// Accepts SQLAlchemy-style URIs (`sqlite:///relative.db`,
    /// `sqlite:////absolute.db`, `sqlite://` for in-memory), `:memory:`,
    /// or a bare filesystem path.
    pub fn target(&self) -> Result<DatabaseTarget> {
        let uri = self.uri.trim();

        if uri.is_empty() {
            bail!("database uri must not be empty");
        }

        if uri == ":memory:" || uri == "sqlite://" || uri == "sqlite:///:memory:" {
            return Ok(DatabaseTarget::Memory);
        }

        if let Some(path) = uri.strip_prefix("sqlite:///") {
            if path.is_empty() {
                bail!("database uri '{}' has no file path", uri);
            }
            return Ok(DatabaseTarget::File(PathBuf::from(path)));
        }

        if let Some((scheme, _)) = uri.split_once("://") {
            bail!(
                "Unsupported database scheme '{}'. Only sqlite URIs are supported",
                scheme
            );
        }

        Ok(DatabaseTarget::File(PathBuf::from(uri)))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text. Missing sections take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load the configuration the binary runs with.
    ///
    /// A missing file is only tolerated when the path was not given explicitly;
    /// in that case every setting takes its default. `DATABASE_URI` is applied
    /// last and the result is validated.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        let mut config = if explicit || path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.override_database_uri(std::env::var(DATABASE_URI_ENV).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn override_database_uri(&mut self, uri: Option<String>) {
        if let Some(uri) = uri.filter(|u| !u.trim().is_empty()) {
            self.database.uri = uri;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        self.database.target()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
