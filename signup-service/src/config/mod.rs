use serde::Deserialize;
use service_core::config::{self as core_config, get_env};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct SignupConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
    pub portals: PortalConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Identity-provider admin endpoint plus its privileged credential.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub service_role_key: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Reject signups whose origin resolves to no portal instead of
    /// skipping the role check.
    pub strict_portal_match: bool,
}

/// Origin substrings identifying each portal surface.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub client_identifiers: Vec<String>,
    pub agent_identifiers: Vec<String>,
    pub admin_identifiers: Vec<String>,
}

impl PortalConfig {
    pub fn is_empty(&self) -> bool {
        self.client_identifiers.is_empty()
            && self.agent_identifiers.is_empty()
            && self.admin_identifiers.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub signup_attempts: u32,
    pub signup_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl SignupConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let mut allowed_origins = split_list(&get_env(
            "ALLOWED_ORIGINS",
            Some("http://localhost:3000,http://localhost:3001,http://localhost:3002"),
            is_prod,
        )?);
        if let Ok(prod_url) = env::var("PROD_URL") {
            let prod_url = prod_url.trim().to_string();
            if !prod_url.is_empty() && !allowed_origins.contains(&prod_url) {
                allowed_origins.push(prod_url);
            }
        }

        let config = SignupConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("signup-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            identity: IdentityConfig {
                base_url: get_env("IDENTITY_BASE_URL", None, is_prod)?,
                service_role_key: get_env("IDENTITY_SERVICE_ROLE_KEY", None, true)?,
                timeout_seconds: get_env("IDENTITY_TIMEOUT_SECONDS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
            },
            security: SecurityConfig {
                allowed_origins,
                strict_portal_match: get_env("STRICT_PORTAL_MATCH", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
            },
            portals: PortalConfig {
                client_identifiers: split_list(&get_env(
                    "PORTAL_CLIENT_IDENTIFIERS",
                    Some("localhost:3000"),
                    is_prod,
                )?),
                agent_identifiers: split_list(&get_env(
                    "PORTAL_AGENT_IDENTIFIERS",
                    Some("localhost:3001"),
                    is_prod,
                )?),
                admin_identifiers: split_list(&get_env(
                    "PORTAL_ADMIN_IDENTIFIERS",
                    Some("localhost:3002"),
                    is_prod,
                )?),
            },
            rate_limit: RateLimitConfig {
                signup_attempts: get_env("RATE_LIMIT_SIGNUP_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                signup_window_seconds: get_env(
                    "RATE_LIMIT_SIGNUP_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.security.allowed_origins.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ALLOWED_ORIGINS must name at least one portal origin"
            )));
        }

        // Strict matching with no portal identifiers would reject every signup.
        if self.security.strict_portal_match && self.portals.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STRICT_PORTAL_MATCH requires at least one PORTAL_*_IDENTIFIERS entry"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
