// Configuration module entry point
// Loads layered configuration (defaults, optional file, environment) and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::invocation::TODOS_URL;

// Re-export public types
pub use state::{wait_for_shutdown, AppState};
pub use types::{Config, LogFormat, LoggingConfig, RoutesConfig};

/// Config file looked up when no path is given (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Prefix for environment overrides, e.g. `GREETER_SERVER__PORT=9100`
pub const ENV_PREFIX: &str = "GREETER";

impl Config {
    /// Load configuration from specified file path (extension optional).
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 9000)?
            .set_default("function.name", "todo-greeter")?
            .set_default("function.upstream_url", TODOS_URL)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "todo-greeter/0.1")?
            .set_default("http.max_body_size", 6_291_456)? // 6MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
