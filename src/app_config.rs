// Centralized configuration management for hix.io backend
// Load ALL env vars ONCE at startup, then pass the AppConfig down explicitly

use ipnetwork::IpNetwork;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::services::auth_guard::AuthorizationPolicy;
use crate::utils::password::PasswordConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub environment: Environment,
    pub request_timeout_secs: u64,

    /// Host name the service itself answers on. Links pointing here are refused.
    pub service_host: String,

    // Store
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub disable_embedded_migrations: bool,

    // Auth
    pub allowed_netblocks: Vec<IpNetwork>,
    /// Honor `X-Forwarded-For`, but only from peers in `trusted_proxies`
    pub trust_forwarded_for: bool,
    pub trusted_proxies: Vec<IpNetwork>,
    pub session_cookie_name: String,
    pub session_ttl_secs: u64,
    pub password: PasswordConfig,

    // Links
    pub short_code_max_retries: u32,
    pub summary_limit: i64,
}

/// Environment type
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which persistence backend the store bundle is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            environment: Environment::Development,
            request_timeout_secs: 30,
            service_host: "hix.io".to_string(),
            store_backend: StoreBackend::Postgres,
            database_url: String::new(),
            database_max_connections: 10,
            database_min_connections: 1,
            database_connect_timeout: 5,
            disable_embedded_migrations: false,
            allowed_netblocks: Vec::new(),
            trust_forwarded_for: false,
            trusted_proxies: Vec::new(),
            session_cookie_name: "hix_io_session".to_string(),
            session_ttl_secs: 1_209_600,
            password: PasswordConfig::default(),
            short_code_max_retries: 5,
            summary_limit: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        // Helper function to parse env var with default
        let parse_or_default = |key: &str, default: u32| -> Result<u32, ConfigError> {
            match env::var(key) {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(key.to_string(), "not a valid u32".to_string())
                }),
                Err(_) => Ok(default),
            }
        };

        let parse_u64_or_default = |key: &str, default: u64| -> Result<u64, ConfigError> {
            match env::var(key) {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
                }),
                Err(_) => Ok(default),
            }
        };

        let parse_bool_or_default = |key: &str, default: bool| -> bool {
            match env::var(key) {
                Ok(raw) => raw.trim().eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        };

        let bind_address = get_or_default("BIND_ADDRESS", &defaults.bind_address);
        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));
        let request_timeout_secs =
            parse_u64_or_default("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;

        let service_host = get_or_default("SERVICE_HOST", &defaults.service_host)
            .trim()
            .trim_end_matches('.')
            .to_lowercase();
        if service_host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVICE_HOST".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let store_backend = get_or_default("STORE_BACKEND", "postgres")
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidValue("STORE_BACKEND".to_string(), e))?;

        let database_url = match store_backend {
            StoreBackend::Postgres => env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            StoreBackend::Memory => get_or_default("DATABASE_URL", ""),
        };
        let database_max_connections =
            parse_or_default("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?;
        let database_min_connections =
            parse_or_default("DATABASE_MIN_CONNECTIONS", defaults.database_min_connections)?;
        if database_min_connections > database_max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS".to_string(),
                "must not exceed DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }
        let database_connect_timeout =
            parse_u64_or_default("DATABASE_CONNECT_TIMEOUT", defaults.database_connect_timeout)?;
        let disable_embedded_migrations =
            parse_bool_or_default("DISABLE_EMBEDDED_MIGRATIONS", false);

        let allowed_netblocks =
            parse_netblocks("ALLOWED_NETBLOCKS", &get_or_default("ALLOWED_NETBLOCKS", ""))?;
        let trust_forwarded_for =
            parse_bool_or_default("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for);
        let trusted_proxies =
            parse_netblocks("TRUSTED_PROXIES", &get_or_default("TRUSTED_PROXIES", ""))?;
        if trust_forwarded_for && trusted_proxies.is_empty() {
            return Err(ConfigError::InvalidValue(
                "TRUSTED_PROXIES".to_string(),
                "required when TRUST_FORWARDED_FOR is enabled".to_string(),
            ));
        }
        let session_cookie_name =
            get_or_default("SESSION_COOKIE_NAME", &defaults.session_cookie_name);
        let session_ttl_secs = parse_u64_or_default("SESSION_TTL_SECS", defaults.session_ttl_secs)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let password = PasswordConfig {
            memory_cost: parse_or_default("PASSWORD_MEMORY_COST", defaults.password.memory_cost)?,
            time_cost: parse_or_default("PASSWORD_TIME_COST", defaults.password.time_cost)?,
            parallelism: parse_or_default("PASSWORD_PARALLELISM", defaults.password.parallelism)?,
            output_length: defaults.password.output_length,
        };

        let short_code_max_retries =
            parse_or_default("SHORT_CODE_MAX_RETRIES", defaults.short_code_max_retries)?;
        let summary_limit = parse_or_default("SUMMARY_LIMIT", defaults.summary_limit as u32)?;
        if !(1..=100).contains(&summary_limit) {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_LIMIT".to_string(),
                "must be between 1 and 100".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            environment,
            request_timeout_secs,
            service_host,
            store_backend,
            database_url,
            database_max_connections,
            database_min_connections,
            database_connect_timeout,
            disable_embedded_migrations,
            allowed_netblocks,
            trust_forwarded_for,
            trusted_proxies,
            session_cookie_name,
            session_ttl_secs,
            password,
            short_code_max_retries,
            summary_limit: summary_limit as i64,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// No netblocks configured means every authenticated identity may write.
    pub fn authorization_policy(&self) -> AuthorizationPolicy {
        if self.allowed_netblocks.is_empty() {
            AuthorizationPolicy::Permissive
        } else {
            AuthorizationPolicy::Netblock(self.allowed_netblocks.clone())
        }
    }
}

fn parse_netblocks(key: &str, raw: &str) -> Result<Vec<IpNetwork>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            IpNetwork::from_str(block).map_err(|e| {
                ConfigError::InvalidValue(key.to_string(), format!("{}: {}", block, e))
            })
        })
        .collect()
}
