// Configuration module entry point
// Layered loading: defaults, optional TOML file, then JSONROUTE_* environment overrides

mod types;

use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use std::net::SocketAddr;

// Re-export public types
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, RouteConfig, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix; nested keys use `__` (e.g. `JSONROUTE_SERVER__PORT`)
pub const ENV_PREFIX: &str = "JSONROUTE";

impl Config {
    /// Load from `config.toml` in the working directory, if present
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load from an in-memory TOML document layered over the defaults
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ConfigError::InvalidAddress(format!(
                    "{}:{} ({e})",
                    self.server.host, self.server.port
                ))
            })
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.adapter", "hyper")?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("http.server_name", "jsonroute/0.1")?
        .set_default("http.max_body_size", 10_485_760)? // 10MB
        .set_default("http.expose_errors", false)
}
