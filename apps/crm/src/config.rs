// Runtime configuration
// Loaded from the environment, with `.env` support for local development

use std::time::Duration;

use thiserror::Error;

/// Default domain appended to usernames for provider sign-in
pub const DEFAULT_LOGIN_DOMAIN: &str = "leaddesk.local";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings shared by every component of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    /// Postgres connection string of the hosted store
    pub database_url: String,
    /// Base URL of the hosted auth provider
    pub auth_url: String,
    /// Public API key sent with every auth call
    pub auth_api_key: String,
    /// Enables local verification of access tokens when set
    pub jwt_secret: Option<String>,
    pub login_domain: String,
    /// Reject a lead whose phone already belongs to another lead
    pub strict_phone_uniqueness: bool,
    /// How long a delete confirmation stays valid
    pub confirmation_ttl: Duration,
    pub backend_timeout: Duration,
    pub db_max_connections: u32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_url: String::new(),
            auth_api_key: String::new(),
            jwt_secret: None,
            login_domain: DEFAULT_LOGIN_DOMAIN.to_string(),
            strict_phone_uniqueness: true,
            confirmation_ttl: Duration::from_secs(120),
            backend_timeout: Duration::from_secs(30),
            db_max_connections: 5,
        }
    }
}

impl CrmConfig {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let defaults = Self::default();

        let login_domain = lookup("LOGIN_EMAIL_DOMAIN").unwrap_or_else(|| {
            tracing::warn!("LOGIN_EMAIL_DOMAIN not set, using {}", DEFAULT_LOGIN_DOMAIN);
            DEFAULT_LOGIN_DOMAIN.to_string()
        });

        let strict_phone_uniqueness = match lookup("STRICT_PHONE_UNIQUENESS") {
            Some(value) => parse_bool("STRICT_PHONE_UNIQUENESS", &value)?,
            None => defaults.strict_phone_uniqueness,
        };

        let confirmation_ttl = match lookup("CONFIRMATION_TTL_SECS") {
            Some(value) => Duration::from_secs(parse_number("CONFIRMATION_TTL_SECS", &value)?),
            None => defaults.confirmation_ttl,
        };

        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_number("BACKEND_TIMEOUT_SECS", &value)?),
            None => defaults.backend_timeout,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => u32::try_from(parse_number("DB_MAX_CONNECTIONS", &value)?)
                .map_err(|_| ConfigError::Invalid {
                    name: "DB_MAX_CONNECTIONS",
                    value,
                })?,
            None => defaults.db_max_connections,
        };

        let jwt_secret = lookup("JWT_SECRET").filter(|secret| !secret.is_empty());
        if jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET not set, access tokens will be resolved remotely");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            auth_url: required("AUTH_URL")?,
            auth_api_key: required("AUTH_API_KEY")?,
            jwt_secret,
            login_domain,
            strict_phone_uniqueness,
            confirmation_ttl,
            backend_timeout,
            db_max_connections,
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
