//! Configuration management for the widget service
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;

/// Backend storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// AWS S3 (or an S3-compatible endpoint)
    S3,
    /// In-process map, for local development
    Memory,
}

impl FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(BackendType::S3),
            "memory" | "mem" => Ok(BackendType::Memory),
            _ => Err(format!("Unknown backend type: {}", s)),
        }
    }
}

/// How the process receives invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// AWS Lambda behind an API Gateway proxy integration
    Lambda,
    /// Local axum HTTP server
    Server,
}

impl FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lambda" => Ok(RuntimeMode::Lambda),
            "server" | "http" => Ok(RuntimeMode::Server),
            _ => Err(format!("Unknown runtime mode: {}", s)),
        }
    }
}

/// Backend storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend type (s3, memory)
    #[serde(rename = "type")]
    pub backend_type: BackendType,

    /// Bucket holding every widget
    #[serde(default)]
    pub bucket: String,

    /// Region override; the default AWS provider chain is used when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint URL (for S3-compatible services)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most S3-compatible services)
    #[serde(default)]
    pub force_path_style: bool,
}

/// Local server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max request body size in bytes (default: 6MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    6 * 1024 * 1024 // Lambda synchronous payload cap
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_runtime() -> RuntimeMode {
    RuntimeMode::Server
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Execution mode
    #[serde(default = "default_runtime")]
    pub runtime: RuntimeMode,

    /// Local server configuration
    pub server: ServerConfig,

    /// Backend storage configuration
    pub backend: BackendConfig,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            server: ServerConfig {
                bind_address: default_bind_address(),
                timeout_secs: default_timeout_secs(),
                max_body_size: default_max_body_size(),
            },
            backend: BackendConfig {
                backend_type: BackendType::S3,
                bucket: String::new(),
                region: None,
                endpoint: None,
                force_path_style: false,
            },
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - BUCKET / WIDGET_BUCKET: bucket name (required for the s3 backend)
    /// - WIDGET_BACKEND: s3|memory (default: s3)
    /// - WIDGET_REGION: AWS region (optional)
    /// - WIDGET_ENDPOINT: custom endpoint URL (optional)
    /// - WIDGET_FORCE_PATH_STYLE: true|false (default: false)
    /// - WIDGET_RUNTIME: lambda|server (default: lambda inside Lambda, else server)
    /// - WIDGET_BIND_ADDRESS: server bind address (default: 0.0.0.0:8080)
    /// - WIDGET_TIMEOUT_SECS: request timeout (default: 30)
    /// - WIDGET_MAX_BODY_SIZE: max request size in bytes (default: 6MB)
    /// - WIDGET_LOG_LEVEL: log level (default: info)
    /// - WIDGET_CONFIG_FILE: optional path to TOML config file
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("WIDGET_CONFIG_FILE") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        // The Lambda runtime always exports its API endpoint
        if lookup("AWS_LAMBDA_RUNTIME_API").is_some() {
            config.runtime = RuntimeMode::Lambda;
        }

        if let Some(runtime) = lookup("WIDGET_RUNTIME") {
            config.runtime = RuntimeMode::from_str(&runtime).map_err(anyhow::Error::msg)?;
        }

        if let Some(backend_type) = lookup("WIDGET_BACKEND") {
            config.backend.backend_type =
                BackendType::from_str(&backend_type).map_err(anyhow::Error::msg)?;
        }

        if let Some(bucket) = lookup("WIDGET_BUCKET").or_else(|| lookup("BUCKET")) {
            config.backend.bucket = bucket;
        }

        if let Some(region) = lookup("WIDGET_REGION") {
            config.backend.region = Some(region);
        }

        if let Some(endpoint) = lookup("WIDGET_ENDPOINT") {
            config.backend.endpoint = Some(endpoint);
        }

        if let Some(path_style) = lookup("WIDGET_FORCE_PATH_STYLE") {
            config.backend.force_path_style = path_style
                .parse()
                .with_context(|| format!("parsing WIDGET_FORCE_PATH_STYLE value `{}`", path_style))?;
        }

        if let Some(addr) = lookup("WIDGET_BIND_ADDRESS") {
            config.server.bind_address = addr
                .parse()
                .with_context(|| format!("parsing WIDGET_BIND_ADDRESS value `{}`", addr))?;
        }

        if let Some(timeout) = lookup("WIDGET_TIMEOUT_SECS") {
            config.server.timeout_secs = timeout
                .parse()
                .with_context(|| format!("parsing WIDGET_TIMEOUT_SECS value `{}`", timeout))?;
        }

        if let Some(size) = lookup("WIDGET_MAX_BODY_SIZE") {
            config.server.max_body_size = size
                .parse()
                .with_context(|| format!("parsing WIDGET_MAX_BODY_SIZE value `{}`", size))?;
        }

        if let Some(level) = lookup("WIDGET_LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_toml(&content).with_context(|| format!("parsing config file {}", path))
    }

    fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject configurations that cannot serve a single invocation
    pub fn validate(&self) -> Result<()> {
        if self.backend.backend_type == BackendType::S3 && self.backend.bucket.trim().is_empty() {
            bail!("BUCKET must be set when using the s3 backend");
        }
        Ok(())
    }
}
