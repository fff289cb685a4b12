// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values and
//! loads them once at startup into an [`AppConfig`]. Components receive
//! their settings through constructors; nothing reads the environment
//! after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WIDGET_SHARED_SECRET` | Login-widget bot token; keys the widget HMAC and token signatures | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for the wallet database | unset (in-memory stores) |
//! | `TOKEN_TTL_SECS` | Bearer token lifetime | `300` |
//! | `KDF` | Password key derivation (`argon2id` or `digest`) | `argon2id` |
//! | `KDF_SALT` | Argon2id deployment salt, at least 8 bytes | built-in |
//! | `RECORD_CACHE_CAPACITY` | Wallet record LRU capacity | `1024` |
//! | `RECORD_CACHE_TTL_SECS` | Wallet record LRU entry lifetime | `300` |
//! | `TLS_CERT_PATH` | PEM certificate chain; HTTPS when set with the key | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_TOKEN_TTL;
use crate::crypto::kdf::MIN_SALT_LEN;

/// Shared secret for widget verification and token signing.
pub const SHARED_SECRET_ENV: &str = "WIDGET_SHARED_SECRET";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Directory holding `wallets.redb`. Unset means in-memory stores.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const KDF_ENV: &str = "KDF";

/// Argon2id salt. Changing it makes every stored secret undecryptable.
pub const KDF_SALT_ENV: &str = "KDF_SALT";

pub const RECORD_CACHE_CAPACITY_ENV: &str = "RECORD_CACHE_CAPACITY";
pub const RECORD_CACHE_TTL_ENV: &str = "RECORD_CACHE_TTL_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_KDF_SALT: &str = "custody-auth-server/wallet-envelope/v1";
pub const DEFAULT_RECORD_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_RECORD_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Password key derivation selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfConfig {
    Argon2id { salt: Vec<u8> },
    Digest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Process configuration, loaded once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub shared_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub token_ttl: Duration,
    pub kdf: KdfConfig,
    pub record_cache_capacity: usize,
    pub record_cache_ttl: Duration,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let shared_secret = get(SHARED_SECRET_ENV).ok_or(ConfigError::Missing(SHARED_SECRET_ENV))?;

        let host = match get(HOST_ENV) {
            Some(host) => parse(HOST_ENV, &host)?,
            None => parse(HOST_ENV, DEFAULT_HOST)?,
        };
        let port = get(PORT_ENV)
            .map(|v| parse(PORT_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let token_ttl = get(TOKEN_TTL_ENV)
            .map(|v| parse_secs(TOKEN_TTL_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_TOKEN_TTL);
        if token_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: TOKEN_TTL_ENV,
                reason: "must be positive".to_string(),
            });
        }

        let kdf = match get(KDF_ENV).as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("argon2id") | Some("argon2") => {
                let salt = get(KDF_SALT_ENV).unwrap_or_else(|| DEFAULT_KDF_SALT.to_string());
                if salt.len() < MIN_SALT_LEN {
                    return Err(ConfigError::Invalid {
                        var: KDF_SALT_ENV,
                        reason: format!("must be at least {MIN_SALT_LEN} bytes"),
                    });
                }
                KdfConfig::Argon2id {
                    salt: salt.into_bytes(),
                }
            }
            Some("digest") | Some("sha256") => KdfConfig::Digest,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: KDF_ENV,
                    reason: format!("unknown key derivation '{other}'"),
                })
            }
        };

        let record_cache_capacity = get(RECORD_CACHE_CAPACITY_ENV)
            .map(|v| parse(RECORD_CACHE_CAPACITY_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_RECORD_CACHE_CAPACITY);
        let record_cache_ttl = get(RECORD_CACHE_TTL_ENV)
            .map(|v| parse_secs(RECORD_CACHE_TTL_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_RECORD_CACHE_TTL);

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            shared_secret,
            host,
            port,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            token_ttl,
            kdf,
            record_cache_capacity,
            record_cache_ttl,
            tls,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("shared_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("token_ttl", &self.token_ttl)
            .field(
                "kdf",
                &match self.kdf {
                    KdfConfig::Argon2id { .. } => "argon2id",
                    KdfConfig::Digest => "digest",
                },
            )
            .field("record_cache_capacity", &self.record_cache_capacity)
            .field("record_cache_ttl", &self.record_cache_ttl)
            .field("tls", &self.tls.is_some())
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse::<u64>(var, value).map(Duration::from_secs)
}
