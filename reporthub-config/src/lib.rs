use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub database: Option<DatabaseSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub worker: Option<WorkerSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct WorkerSection {
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite://reporthub.sqlite".to_string(),
                max_connections: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            worker: WorkerConfig { enabled: true },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        if let Some(server) = raw.server {
            apply_opt!(cfg.server.host, server.host);
            apply_opt!(cfg.server.port, server.port);
        }
        if let Some(db) = raw.database {
            apply_opt!(cfg.database.url, db.url);
            apply_opt!(cfg.database.max_connections, db.max_connections);
        }
        if let Some(logging) = raw.logging {
            apply_opt!(cfg.logging.level, logging.level);
            apply_opt!(cfg.logging.json, logging.json);
        }
        if let Some(worker) = raw.worker {
            apply_opt!(cfg.worker.enabled, worker.enabled);
        }
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

/// Helper to get env var as string
#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    if let Some(v) = env_str("REPORTHUB_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("REPORTHUB_SERVER_PORT")? {
        cfg.server.port = v;
    }

    if let Some(v) = env_str("REPORTHUB_DATABASE_URL") {
        cfg.database.url = v;
    }
    if let Some(v) = env_parse::<u32>("REPORTHUB_DB_MAX_CONNECTIONS")? {
        cfg.database.max_connections = v;
    }

    if let Some(v) = env_str("REPORTHUB_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("REPORTHUB_LOG_JSON")? {
        cfg.logging.json = v;
    }

    if let Some(v) = env_bool("REPORTHUB_WORKER_ENABLED")? {
        cfg.worker.enabled = v;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.worker.enabled);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn parse_bool_accepts_common_forms() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("YES"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn loads_toml_file_and_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reporthub.toml");
        let mut file = std::fs::File::create(&path).expect("create file");
        write!(
            file,
            r#"
[server]
port = 8080

[database]
url = "sqlite::memory:"

[worker]
enabled = false
"#
        )
        .expect("write file");

        let cfg = load_config(Some(&path)).expect("load config");
        assert_eq!(cfg.server.port, 8080);
        // host untouched by the file keeps its default
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert!(!cfg.worker.enabled);
    }

    #[cfg(feature = "json")]
    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reporthub.json");
        std::fs::write(&path, r#"{"logging": {"level": "debug", "json": true}}"#)
            .expect("write file");

        let cfg = load_config(Some(&path)).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }
}
