use std::env;
use std::net::{IpAddr, SocketAddr};
use tracing::warn;

pub const DEFAULT_TTL_MINUTES: i64 = 5;
pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

const MIN_TTL_MINUTES: i64 = 1;
const MAX_TTL_MINUTES: i64 = 24 * 60;
const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0}")]
    Production(String),
}

/// Knobs for the email verification step.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub ttl: chrono::Duration,
    pub code_length: usize,
    pub purge_interval: std::time::Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        VerificationConfig {
            ttl: chrono::Duration::minutes(DEFAULT_TTL_MINUTES),
            code_length: DEFAULT_CODE_LENGTH,
            purge_interval: std::time::Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS),
        }
    }
}

impl VerificationConfig {
    /// Reads `VERIFICATION_TTL_MINUTES`, `VERIFICATION_CODE_LENGTH` and
    /// `VERIFICATION_PURGE_INTERVAL_SECS`. Unset or unusable values fall back
    /// to the defaults with a warning.
    pub fn from_env() -> Self {
        let ttl_minutes = parse_env("VERIFICATION_TTL_MINUTES", DEFAULT_TTL_MINUTES)
            .filter(|minutes| (MIN_TTL_MINUTES..=MAX_TTL_MINUTES).contains(minutes))
            .unwrap_or_else(|| {
                warn!(
                    "VERIFICATION_TTL_MINUTES must be between {} and {}; using {}",
                    MIN_TTL_MINUTES, MAX_TTL_MINUTES, DEFAULT_TTL_MINUTES
                );
                DEFAULT_TTL_MINUTES
            });

        let code_length = parse_env("VERIFICATION_CODE_LENGTH", DEFAULT_CODE_LENGTH)
            .filter(|len| (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(len))
            .unwrap_or_else(|| {
                warn!(
                    "VERIFICATION_CODE_LENGTH must be between {} and {}; using {}",
                    MIN_CODE_LENGTH, MAX_CODE_LENGTH, DEFAULT_CODE_LENGTH
                );
                DEFAULT_CODE_LENGTH
            });

        let purge_secs = parse_env(
            "VERIFICATION_PURGE_INTERVAL_SECS",
            DEFAULT_PURGE_INTERVAL_SECS,
        )
        .filter(|secs| *secs > 0)
        .unwrap_or_else(|| {
            warn!(
                "VERIFICATION_PURGE_INTERVAL_SECS must be a positive integer; using {}",
                DEFAULT_PURGE_INTERVAL_SECS
            );
            DEFAULT_PURGE_INTERVAL_SECS
        });

        VerificationConfig {
            ttl: chrono::Duration::minutes(ttl_minutes),
            code_length,
            purge_interval: std::time::Duration::from_secs(purge_secs),
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host_raw = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let host = host_raw.parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
            key: "HOST",
            value: host_raw.clone(),
        })?;

        let port_raw = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            key: "PORT",
            value: port_raw.clone(),
        })?;

        Ok(ServerConfig { host, port })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

/// In production the console mailer would silently swallow verification codes,
/// so a real SMTP host and an https `BASE_URL` are required.
pub fn validate_production_config() -> Result<(), ConfigError> {
    if !is_production() {
        return Ok(());
    }

    if env::var("SMTP_HOST").map(|h| h.is_empty()).unwrap_or(true) {
        return Err(ConfigError::Production(
            "Production environment requires SMTP_HOST for verification emails".to_string(),
        ));
    }

    let base_url = env::var("BASE_URL").unwrap_or_default();
    if !base_url.starts_with("https://") {
        return Err(ConfigError::Production(
            "Production environment requires an https BASE_URL".to_string(),
        ));
    }

    Ok(())
}

pub fn current_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

pub fn is_production() -> bool {
    current_environment() == "production"
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Option<T> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().ok(),
        Err(_) => Some(default),
    }
}
