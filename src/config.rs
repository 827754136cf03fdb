// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and passed
//! down explicitly. Nothing reads the environment after [`Config::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the database file | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SIGNATURE_KEY` | HS256 secret used to verify identity tokens | Required |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage::{paths::DATA_ROOT, StoragePaths};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SIGNATURE_KEY_ENV: &str = "JWT_SIGNATURE_KEY";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const RUST_LOG_ENV: &str = "RUST_LOG";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason: format!("expected 'json' or 'pretty', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the server needs to start.
#[derive(Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_signature_key: String,
    pub jwt_issuer: Option<String>,
    pub log_format: LogFormat,
    pub log_filter: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_signature_key", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("log_format", &self.log_format)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = match get(HOST_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                reason: format!("'{raw}' is not an IP address"),
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let jwt_signature_key =
            get(JWT_SIGNATURE_KEY_ENV).ok_or(ConfigError::Missing(JWT_SIGNATURE_KEY_ENV))?;

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            data_dir: get(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_ROOT)),
            host,
            port,
            jwt_signature_key,
            jwt_issuer: get(JWT_ISSUER_ENV).map(|s| s.trim().to_string()),
            log_format,
            log_filter: get(RUST_LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn storage_paths(&self) -> StoragePaths {
        StoragePaths::new(&self.data_dir)
    }
}
