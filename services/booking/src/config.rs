//! Layered service configuration
//!
//! Sources, lowest precedence first: built-in defaults, the optional
//! `config/default`, `config/{RUN_MODE}` and `config/local` files, then
//! `FLYNOW__`-prefixed environment variables (`FLYNOW__AUTH__JWT_SECRET`).

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Longest accepted session lifetime (one year)
const MAX_TOKEN_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Complete service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    /// Operator-provisioned admin account
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in seconds
    pub token_ttl_seconds: u64,
    pub cookie_name: String,
    /// Send the cookie with `Secure`; only disable for plain-http development
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
    pub password: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl AppConfig {
    /// Load configuration from files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 9000)?
            .set_default("auth.token_ttl_seconds", 86_400)?
            .set_default("auth.cookie_name", "token")?
            .set_default("auth.cookie_secure", true)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5173"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("FLYNOW")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().len() < 16 {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be at least 16 characters".to_string(),
            ));
        }
        let ttl = self.auth.token_ttl_seconds;
        if ttl == 0 || ttl > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_seconds must be between 1 and {}",
                MAX_TOKEN_TTL_SECONDS
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
