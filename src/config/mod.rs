//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::services::stump::events::{EventHandlerConfig, EventMode};
use crate::services::stump::events::reconnect::ReconnectConfig;

/// Adapter configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Stump server (e.g. `http://localhost:10801`)
    pub stump_url: String,

    /// API key sent as a bearer token
    pub stump_api_key: String,

    /// Push, poll, or push with polling fallback
    pub event_mode: EventMode,

    /// Interval between poll sweeps
    pub poll_interval: Duration,

    /// First reconnect delay of the push session
    pub reconnect_initial: Duration,

    /// Ceiling for the reconnect delay
    pub reconnect_max: Duration,

    /// Give up after this many consecutive failures (None = retry forever)
    pub reconnect_max_attempts: Option<u32>,

    /// Consecutive failures before the circuit opens
    pub circuit_threshold: u32,

    /// Per-listener timeout during fan-out (None = wait for the listener)
    pub listener_timeout: Option<Duration>,

    /// Timeout for individual GraphQL and file requests
    pub request_timeout: Duration,

    /// Emit JSON logs instead of the human readable format
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stump_url = lookup("STUMP_URL").context("STUMP_URL is required")?;
        let stump_api_key = lookup("STUMP_API_KEY").context("STUMP_API_KEY is required")?;

        let event_mode = match lookup("STUMP_EVENT_MODE") {
            Some(v) => v.parse().context("Invalid STUMP_EVENT_MODE")?,
            None => EventMode::Auto,
        };

        let reconnect_defaults = ReconnectConfig::default();

        Ok(Self {
            stump_url,
            stump_api_key,
            event_mode,

            poll_interval: Duration::from_secs(
                parse_or(&lookup, "STUMP_POLL_INTERVAL_SECS", 300)?,
            ),

            reconnect_initial: Duration::from_millis(parse_or(
                &lookup,
                "STUMP_RECONNECT_INITIAL_MS",
                reconnect_defaults.initial_interval.as_millis() as u64,
            )?),

            reconnect_max: Duration::from_secs(parse_or(
                &lookup,
                "STUMP_RECONNECT_MAX_SECS",
                reconnect_defaults.max_interval.as_secs(),
            )?),

            reconnect_max_attempts: parse_opt(&lookup, "STUMP_RECONNECT_MAX_ATTEMPTS")?,

            circuit_threshold: parse_or(
                &lookup,
                "STUMP_CIRCUIT_THRESHOLD",
                reconnect_defaults.circuit_threshold,
            )?,

            listener_timeout: parse_opt(&lookup, "STUMP_LISTENER_TIMEOUT_SECS")?
                .map(Duration::from_secs),

            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "STUMP_REQUEST_TIMEOUT_SECS",
                30,
            )?),

            log_json: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Event handler settings derived from this configuration
    pub fn event_handler_config(&self) -> EventHandlerConfig {
        EventHandlerConfig {
            mode: self.event_mode,
            poll_interval: self.poll_interval,
            listener_timeout: self.listener_timeout,
            reconnect: ReconnectConfig {
                initial_interval: self.reconnect_initial,
                max_interval: self.reconnect_max,
                max_attempts: self.reconnect_max_attempts,
                circuit_threshold: self.circuit_threshold,
                ..ReconnectConfig::default()
            },
            ..EventHandlerConfig::default()
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid {key}")),
        _ => Ok(None),
    }
}
