// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FIREBASE_PROJECT_ID` | Project whose ID tokens are accepted | Required (otherwise every request is a `SERVER_ERROR`) |
//! | `FIREBASE_JWKS_URL` | JWKS endpoint for signature keys | Google securetoken JWKS |
//! | `JWKS_CACHE_TTL_SECS` | How long a fetched key set is reused | `3600` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for one JWKS request | `10` |
//! | `AUTH_EXPOSE_DETAILS` | Include rejection detail in 401 bodies | `false` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use url::{Host, Url};

use crate::auth::jwks::{DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_JWKS_URL};

pub const PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const JWKS_URL_ENV: &str = "FIREBASE_JWKS_URL";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const EXPOSE_DETAILS_ENV: &str = "AUTH_EXPOSE_DETAILS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got `{value}`")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("JWKS URL `{0}` must use https (plain http is only allowed for loopback hosts)")]
    InsecureJwksUrl(String),
}

/// Token verification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// `None` leaves the verifier unconfigured.
    pub project_id: Option<String>,
    pub jwks_url: Url,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub expose_details: bool,
}

impl AuthSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let project_id = lookup(PROJECT_ID_ENV)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let raw_url = lookup(JWKS_URL_ENV).unwrap_or_else(|| DEFAULT_JWKS_URL.to_string());
        let jwks_url = Url::parse(&raw_url).map_err(|_| ConfigError::Invalid {
            var: JWKS_URL_ENV,
            expected: "an absolute URL",
            value: raw_url.clone(),
        })?;
        if !is_secure_url(&jwks_url) {
            return Err(ConfigError::InsecureJwksUrl(raw_url));
        }

        Ok(Self {
            project_id,
            jwks_url,
            cache_ttl: secs_or(&lookup, JWKS_CACHE_TTL_ENV, DEFAULT_CACHE_TTL)?,
            fetch_timeout: secs_or(&lookup, JWKS_FETCH_TIMEOUT_ENV, DEFAULT_FETCH_TIMEOUT)?,
            expose_details: bool_or(&lookup, EXPOSE_DETAILS_ENV, false)?,
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup(PORT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    expected: "`json` or `pretty`",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_secure_url(url: &Url) -> bool {
    match url.scheme() {
        "https" => true,
        "http" => match url.host() {
            Some(Host::Domain(domain)) => domain == "localhost",
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        },
        _ => false,
    }
}

fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::Invalid {
                var,
                expected: "a positive number of seconds",
                value,
            }),
        None => Ok(default),
    }
}

fn bool_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(var).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value: other.to_string(),
        }),
    }
}
