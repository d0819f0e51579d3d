use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_clicks_file")]
    pub clicks_file: PathBuf,
    /// Hold the exclusive lock across the whole read-modify-write of an increment.
    #[serde(default = "default_serialize_increments")]
    pub serialize_increments: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            clicks_file: default_clicks_file(),
            serialize_increments: default_serialize_increments(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 5000 }
fn default_clicks_file() -> PathBuf { PathBuf::from("clicks.json") }
fn default_serialize_increments() -> bool { true }
fn default_log_format() -> String { "compact".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when it
    /// is absent, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                _ => return Err(e),
            },
        };
        cfg.apply_env_overrides(|k| std::env::var(k).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Override individual fields from environment-style lookups.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(path) = lookup("CLICKS_FILE") {
            self.storage.clicks_file = PathBuf::from(path);
        }
        if let Some(fmt) = lookup("LOG_FORMAT") {
            self.logging.format = fmt;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.clicks_file.as_os_str().is_empty() {
            return Err(anyhow!("storage.clicks_file must not be empty"));
        }
        Ok(())
    }
}
