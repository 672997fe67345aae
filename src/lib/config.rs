//! This module loads the configuration for the server and the client.
//!
//! Values are layered: built-in defaults first, then an optional TOML file,
//! then `NOTES_*` environment variables. `NOTES_CONFIG` is reserved for the
//! file location and never read as a setting.
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat, Map};
use serde::Deserialize;
use thiserror::Error;

/// The prefix for all environment variables read by this crate.
const ENV_PREFIX: &str = "NOTES";

/// Overrides the location of the configuration file when set.
pub const CONFIG_PATH_VAR: &str = "NOTES_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid listen host {0:?}")]
    InvalidHost(String),
    #[error("failed to find the config base path")]
    MissingBasePath,
}

/// Settings for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound, in milliseconds, on the time spent serving a single request.
    pub request_timeout_ms: u64,
    /// Upper bound on the size of a request body.
    pub max_body_bytes: usize,
    /// A `tracing_subscriber::EnvFilter` directive, used unless `RUST_LOG` is set.
    pub log_filter: String,
    /// When set, logs are written to a daily rolling file in this directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Loads the server configuration, reading `path` if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, process_env())
    }

    /// Loads the server configuration with `env` standing in for the process
    /// environment.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("request_timeout_ms", 10_000_i64)?
            .set_default("max_body_bytes", 1_048_576_i64)?
            .set_default("log_filter", "notes=info,server=info,tower_http=debug")?;

        Ok(layered(builder, path, env).build()?.try_deserialize()?)
    }

    /// The socket address the server should listen on.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;

        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Settings for the command line client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// The base URL for making API requests.
    pub base_url: String,
}

impl ClientConfig {
    /// Loads the client configuration, reading `path` if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, process_env())
    }

    pub fn load_with_env(
        path: Option<&Path>,
        env: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder().set_default("base_url", "http://localhost:8080")?;

        Ok(layered(builder, path, env).build()?.try_deserialize()?)
    }
}

/// The process environment without the reserved file location variable.
fn process_env() -> Map<String, String> {
    std::env::vars()
        .filter(|(key, _)| key != CONFIG_PATH_VAR)
        .collect()
}

fn layered(
    builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
    env: Map<String, String>,
) -> ConfigBuilder<DefaultState> {
    let builder = match path {
        Some(path) => builder.add_source(
            File::from(path.to_path_buf())
                .required(false)
                .format(FileFormat::Toml),
        ),
        None => builder,
    };

    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(env)),
    )
}

/// Finds the location for this app's local configuration.
pub fn config_base_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        Ok(PathBuf::from(path))
    } else if let Some(home) = dirs::home_dir() {
        Ok(home.join(".config"))
    } else {
        Err(ConfigError::MissingBasePath)
    }
}

/// Resolves the configuration file to read: `$NOTES_CONFIG` when set,
/// otherwise `<config base>/notes/<file_name>`.
pub fn config_file_path(file_name: &str) -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Ok(PathBuf::from(path));
    }

    Ok(config_base_path()?.join("notes").join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn server_defaults_apply_without_a_file() {
        let config = ServerConfig::load_with_env(None, Map::new()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_body_bytes, 1 << 20);
        assert!(config.log_dir.is_none());
        assert_eq!(
            config.listen_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ServerConfig::load_with_env(Some(&dir.path().join("absent.toml")), Map::new())
                .unwrap();

        assert_eq!(config.port, 8080);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");

        fs::write(
            &path,
            "host = \"127.0.0.1\"\nport = 9000\nlog_dir = \"/var/log/notes\"\n",
        )
        .unwrap();

        let config = ServerConfig::load_with_env(Some(&path), Map::new()).unwrap();

        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/notes")));
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn invalid_host_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");

        fs::write(&path, "host = \"not an address\"\n").unwrap();

        let config = ServerConfig::load_with_env(Some(&path), Map::new()).unwrap();

        assert!(matches!(
            config.listen_addr(),
            Err(ConfigError::InvalidHost(host)) if host == "not an address"
        ));
    }

    #[test]
    fn client_reads_base_url_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");

        fs::write(&path, "base_url = \"http://notes.internal:3000\"\n").unwrap();

        let config = ClientConfig::load_with_env(Some(&path), Map::new()).unwrap();

        assert_eq!(config.base_url, "http://notes.internal:3000");
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");

        fs::write(&path, "port = 9000
").unwrap();

        let env = Map::from([
            ("NOTES_PORT".to_string(), "9100".to_string()),
            ("NOTES_REQUEST_TIMEOUT_MS".to_string(), "250".to_string()),
            ("OTHER_PORT".to_string(), "1".to_string()),
        ]);
        let config = ServerConfig::load_with_env(Some(&path), env).unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn config_path_variable_is_not_a_setting() {
        std::env::set_var(CONFIG_PATH_VAR, "/etc/notes/server.toml");

        let env = process_env();

        std::env::remove_var(CONFIG_PATH_VAR);

        assert!(!env.contains_key(CONFIG_PATH_VAR));
    }
}
