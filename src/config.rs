use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::reputation::{
    DEFAULT_GLOBAL_AVERAGE, DEFAULT_MIN_VOTES, DEFAULT_RANKING_LIMIT, MAX_SCORE,
};
use crate::verification::{DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL, DEFAULT_MAX_ATTEMPTS};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub reputation: ReputationConfig,
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Enable API key authentication
    pub enable_auth: bool,
    /// Accepted API keys
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
    /// Rate limit per minute per IP
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[serde(skip_serializing)]
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses in-memory store)
    pub postgres_enabled: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Mask client IPs, codes and keys in logs
    pub sanitize_logs: bool,
    /// Enable per-request logging
    pub log_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Confidence threshold of the Bayesian average
    pub min_votes: u32,
    /// Population mean used before anyone is rated
    pub default_global_average: f64,
    /// Leaderboard size
    pub ranking_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Seconds a code stays valid
    pub code_ttl_secs: u64,
    /// Digits per code
    pub code_length: usize,
    /// Wrong guesses before a code is revoked
    pub max_attempts: u32,
    /// Seconds between expired-code sweeps
    pub purge_interval_secs: u64,
}

impl VerificationConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_secs)
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            min_votes: DEFAULT_MIN_VOTES,
            default_global_average: DEFAULT_GLOBAL_AVERAGE,
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: DEFAULT_CODE_TTL.as_secs(),
            code_length: DEFAULT_CODE_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            purge_interval_secs: 60,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/carpool".to_string(),
            postgres_enabled: false,
            max_connections: 10,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            security: SecurityConfig {
                enable_auth: false,
                api_keys: Vec::new(),
                rate_limit_per_minute: 120,
                max_request_size: 64 * 1024,
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                sanitize_logs: true,
                log_requests: true,
            },
            reputation: ReputationConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid {} value", name)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from `CARPOOL_*` environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = env::var("CARPOOL_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var("CARPOOL_PORT")? {
            config.server.port = port;
        }

        // Security
        if let Some(enable_auth) = parse_var("CARPOOL_ENABLE_AUTH")? {
            config.security.enable_auth = enable_auth;
        }
        if let Some(limit) = parse_var("CARPOOL_RATE_LIMIT_PER_MINUTE")? {
            config.security.rate_limit_per_minute = limit;
        }
        if let Some(size) = parse_var("CARPOOL_MAX_REQUEST_SIZE")? {
            config.security.max_request_size = size;
        }
        config.security.api_keys = Self::load_api_keys();

        // Database
        if let Ok(url) = env::var("CARPOOL_POSTGRES_URL") {
            config.database.postgres_url = url;
        }
        if let Some(enabled) = parse_var("CARPOOL_POSTGRES_ENABLED")? {
            config.database.postgres_enabled = enabled;
        }
        if let Some(max) = parse_var("CARPOOL_POSTGRES_MAX_CONNECTIONS")? {
            config.database.max_connections = max;
        }

        // Logging
        if let Ok(level) = env::var("CARPOOL_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(sanitize) = parse_var("CARPOOL_SANITIZE_LOGS")? {
            config.logging.sanitize_logs = sanitize;
        }
        if let Some(log_requests) = parse_var("CARPOOL_LOG_REQUESTS")? {
            config.logging.log_requests = log_requests;
        }

        // Reputation
        if let Some(min_votes) = parse_var("CARPOOL_REPUTATION_MIN_VOTES")? {
            config.reputation.min_votes = min_votes;
        }
        if let Some(avg) = parse_var("CARPOOL_REPUTATION_DEFAULT_GLOBAL_AVERAGE")? {
            config.reputation.default_global_average = avg;
        }
        if let Some(limit) = parse_var("CARPOOL_RANKING_LIMIT")? {
            config.reputation.ranking_limit = limit;
        }

        // Verification codes
        if let Some(ttl) = parse_var("CARPOOL_VERIFICATION_CODE_TTL_SECS")? {
            config.verification.code_ttl_secs = ttl;
        }
        if let Some(len) = parse_var("CARPOOL_VERIFICATION_CODE_LENGTH")? {
            config.verification.code_length = len;
        }
        if let Some(max) = parse_var("CARPOOL_VERIFICATION_MAX_ATTEMPTS")? {
            config.verification.max_attempts = max;
        }
        if let Some(interval) = parse_var("CARPOOL_VERIFICATION_PURGE_INTERVAL_SECS")? {
            config.verification.purge_interval_secs = interval;
        }

        config.validate()?;

        Ok(config)
    }

    /// `CARPOOL_API_KEY` plus comma-separated `CARPOOL_API_KEYS`
    fn load_api_keys() -> Vec<String> {
        let mut keys = Vec::new();

        if let Ok(key) = env::var("CARPOOL_API_KEY") {
            if !key.trim().is_empty() {
                keys.push(key.trim().to_string());
            }
        }

        if let Ok(extra) = env::var("CARPOOL_API_KEYS") {
            keys.extend(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string),
            );
        }

        keys
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.security.enable_auth && self.security.api_keys.is_empty() {
            return Err(anyhow::anyhow!(
                "Authentication is enabled but no API key is configured (CARPOOL_API_KEY)"
            ));
        }
        if self.security.rate_limit_per_minute == 0 {
            return Err(anyhow::anyhow!("Rate limit must be greater than zero"));
        }

        if self.database.postgres_enabled && self.database.postgres_url.is_empty() {
            return Err(anyhow::anyhow!("PostgreSQL is enabled but no URL is set"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than zero"));
        }

        if self.reputation.min_votes == 0 {
            return Err(anyhow::anyhow!("min_votes must be greater than zero"));
        }
        let avg = self.reputation.default_global_average;
        if !avg.is_finite() || !(0.0..=MAX_SCORE).contains(&avg) {
            return Err(anyhow::anyhow!(
                "Default global average must be within 0-5, got {}",
                avg
            ));
        }
        if self.reputation.ranking_limit == 0 {
            return Err(anyhow::anyhow!("Ranking limit must be greater than zero"));
        }

        if self.verification.code_ttl_secs == 0 {
            return Err(anyhow::anyhow!("Verification code TTL must be greater than zero"));
        }
        if !(4..=10).contains(&self.verification.code_length) {
            return Err(anyhow::anyhow!(
                "Verification code length must be between 4 and 10, got {}",
                self.verification.code_length
            ));
        }
        if self.verification.max_attempts == 0 {
            return Err(anyhow::anyhow!("Verification max_attempts must be greater than zero"));
        }
        if self.verification.purge_interval_secs == 0 {
            return Err(anyhow::anyhow!("Purge interval must be greater than zero"));
        }

        if !self.logging.sanitize_logs {
            warn!("Log sanitization disabled - client IPs and verification codes may be logged");
        }

        Ok(())
    }
}

/// Mask a sensitive value for logging, keeping a short prefix and suffix
pub fn sanitize_for_logging(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_auth_requires_keys() {
        let mut config = AppConfig::default();
        config.security.enable_auth = true;
        assert!(config.validate().is_err());

        config.security.api_keys.push("k".repeat(32));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reputation_bounds() {
        let mut config = AppConfig::default();
        config.reputation.min_votes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.reputation.default_global_average = 5.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.reputation.ranking_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_verification_bounds() {
        let mut config = AppConfig::default();
        config.verification.code_length = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.verification.code_ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.verification.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(sanitize_for_logging("123456"), "******");
        assert_eq!(sanitize_for_logging("carpool@example.edu"), "carp....edu");
        let ip = sanitize_for_logging("192.168.1.100");
        assert!(ip.starts_with("192."));
        assert!(ip.ends_with(".100"));
    }
}
