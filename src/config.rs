// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the bridge. Configuration is loaded from the environment once
//! at startup into a [`BridgeConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | API bind address | `127.0.0.1` |
//! | `PORT` | API bind port | `32869` |
//! | `BURNER_BRIDGE_URL` | WebSocket of the local USB bridge process | `ws://127.0.0.1:32868/ws` |
//! | `BURNER_GATEWAY_URL` | WebSocket of the phone gateway relay | `wss://gateway.openburner.app/ws` |
//! | `BURNER_PAIRING_BASE_URL` | Page the phone opens to join a gateway session | `https://gateway.openburner.app/pair` |
//! | `BURNER_BRIDGE_CONNECT_TIMEOUT_MS` | Bridge reachability window | `3000` |
//! | `BURNER_RELAY_CONNECT_TIMEOUT_MS` | Relay reachability window | `5000` |
//! | `BURNER_PAIRING_TIMEOUT_SECS` | Time allowed for a phone to pair | `120` |
//! | `BURNER_TAP_TIMEOUT_SECS` | Time allowed for a tap per command | `30` |
//! | `BURNER_KEY_SLOT` | Key slot on the token used for signing | `1` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const BRIDGE_URL_ENV: &str = "BURNER_BRIDGE_URL";
pub const GATEWAY_URL_ENV: &str = "BURNER_GATEWAY_URL";
pub const PAIRING_BASE_URL_ENV: &str = "BURNER_PAIRING_BASE_URL";
pub const BRIDGE_CONNECT_TIMEOUT_ENV: &str = "BURNER_BRIDGE_CONNECT_TIMEOUT_MS";
pub const RELAY_CONNECT_TIMEOUT_ENV: &str = "BURNER_RELAY_CONNECT_TIMEOUT_MS";
pub const PAIRING_TIMEOUT_ENV: &str = "BURNER_PAIRING_TIMEOUT_SECS";
pub const TAP_TIMEOUT_ENV: &str = "BURNER_TAP_TIMEOUT_SECS";
pub const KEY_SLOT_ENV: &str = "BURNER_KEY_SLOT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 32869;
const DEFAULT_BRIDGE_URL: &str = "ws://127.0.0.1:32868/ws";
const DEFAULT_GATEWAY_URL: &str = "wss://gateway.openburner.app/ws";
const DEFAULT_PAIRING_BASE_URL: &str = "https://gateway.openburner.app/pair";
const DEFAULT_BRIDGE_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_RELAY_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PAIRING_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TAP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_KEY_SLOT: u8 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} must be a positive integer, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must use one of the schemes {expected:?}, got `{scheme}`")]
    UnsupportedScheme {
        name: &'static str,
        scheme: String,
        expected: &'static [&'static str],
    },

    #[error("Invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("LOG_FORMAT must be `json` or `pretty`, got `{0}`")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Settings consumed by the two transport adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub bridge_url: Url,
    pub gateway_url: Url,
    pub pairing_base_url: Url,
    pub bridge_connect_timeout: Duration,
    pub relay_connect_timeout: Duration,
    pub pairing_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bridge_url: Url::parse(DEFAULT_BRIDGE_URL).expect("default bridge URL is valid"),
            gateway_url: Url::parse(DEFAULT_GATEWAY_URL).expect("default gateway URL is valid"),
            pairing_base_url: Url::parse(DEFAULT_PAIRING_BASE_URL)
                .expect("default pairing URL is valid"),
            bridge_connect_timeout: Duration::from_millis(DEFAULT_BRIDGE_CONNECT_TIMEOUT_MS),
            relay_connect_timeout: Duration::from_millis(DEFAULT_RELAY_CONNECT_TIMEOUT_MS),
            pairing_timeout: Duration::from_secs(DEFAULT_PAIRING_TIMEOUT_SECS),
        }
    }
}

/// Settings consumed by sessions and the signing coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a single command may wait for the user to tap.
    pub tap_timeout: Duration,
    /// Key slot on the token used for signing.
    pub key_slot: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tap_timeout: Duration::from_secs(DEFAULT_TAP_TIMEOUT_SECS),
            key_slot: DEFAULT_KEY_SLOT,
        }
    }
}

/// Full runtime configuration of the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub bind_addr: SocketAddr,
    pub transport: TransportConfig,
    pub session: SessionConfig,
    pub log_format: LogFormat,
}

impl BridgeConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidNumber {
                    name: PORT_ENV,
                    value: raw,
                })?,
            None => DEFAULT_PORT,
        };
        let ip = IpAddr::from_str(host.trim())
            .map_err(|_| ConfigError::InvalidBindAddress(host.clone()))?;
        let bind_addr = SocketAddr::new(ip, port);

        let transport = TransportConfig {
            bridge_url: parse_url(
                BRIDGE_URL_ENV,
                get(BRIDGE_URL_ENV).as_deref().unwrap_or(DEFAULT_BRIDGE_URL),
                &["ws", "wss"],
            )?,
            gateway_url: parse_url(
                GATEWAY_URL_ENV,
                get(GATEWAY_URL_ENV).as_deref().unwrap_or(DEFAULT_GATEWAY_URL),
                &["ws", "wss"],
            )?,
            pairing_base_url: parse_url(
                PAIRING_BASE_URL_ENV,
                get(PAIRING_BASE_URL_ENV)
                    .as_deref()
                    .unwrap_or(DEFAULT_PAIRING_BASE_URL),
                &["http", "https"],
            )?,
            bridge_connect_timeout: Duration::from_millis(parse_positive(
                BRIDGE_CONNECT_TIMEOUT_ENV,
                get(BRIDGE_CONNECT_TIMEOUT_ENV),
                DEFAULT_BRIDGE_CONNECT_TIMEOUT_MS,
            )?),
            relay_connect_timeout: Duration::from_millis(parse_positive(
                RELAY_CONNECT_TIMEOUT_ENV,
                get(RELAY_CONNECT_TIMEOUT_ENV),
                DEFAULT_RELAY_CONNECT_TIMEOUT_MS,
            )?),
            pairing_timeout: Duration::from_secs(parse_positive(
                PAIRING_TIMEOUT_ENV,
                get(PAIRING_TIMEOUT_ENV),
                DEFAULT_PAIRING_TIMEOUT_SECS,
            )?),
        };

        let key_slot = parse_positive(KEY_SLOT_ENV, get(KEY_SLOT_ENV), DEFAULT_KEY_SLOT as u64)?;
        let key_slot = u8::try_from(key_slot).map_err(|_| ConfigError::InvalidNumber {
            name: KEY_SLOT_ENV,
            value: key_slot.to_string(),
        })?;

        let session = SessionConfig {
            tap_timeout: Duration::from_secs(parse_positive(
                TAP_TIMEOUT_ENV,
                get(TAP_TIMEOUT_ENV),
                DEFAULT_TAP_TIMEOUT_SECS,
            )?),
            key_slot,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            transport,
            session,
            log_format,
        })
    }
}

fn parse_url(
    name: &'static str,
    raw: &str,
    schemes: &'static [&'static str],
) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            name,
            scheme: url.scheme().to_string(),
            expected: schemes,
        });
    }
    Ok(url)
}

fn parse_positive(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidNumber { name, value }),
    }
}
