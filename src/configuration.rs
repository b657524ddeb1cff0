use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::error::ConfigError;

/// Minimum accepted length of a configured signing secret (HS256 key size).
pub const MIN_SECRET_LENGTH: usize = 32;
const GENERATED_SECRET_LENGTH: usize = 64;
/// Longest accepted session lifetime (one year).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

/// Credential hashing and session token settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// HS256 signing secret. Generated per process when absent.
    #[serde(default)]
    pub secret: Option<String>,
    pub token_ttl_seconds: i64,  // e.g. 86400 for 24 hours
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthSettings {
    /// Resolve the signing key for this process.
    ///
    /// A configured secret must be at least `MIN_SECRET_LENGTH` bytes. With no
    /// secret configured a random one is generated, so tokens issued by this
    /// process stop verifying after a restart.
    pub fn signing_secret(&self) -> Result<Vec<u8>, ConfigError> {
        match &self.secret {
            Some(secret) if secret.len() < MIN_SECRET_LENGTH => Err(ConfigError::InvalidValue(
                format!("auth.secret must be at least {} bytes", MIN_SECRET_LENGTH),
            )),
            Some(secret) => Ok(secret.as_bytes().to_vec()),
            None => {
                tracing::warn!(
                    "auth.secret not configured; generated an ephemeral signing key, \
                     issued tokens will not survive a restart"
                );
                Ok(generate_secret().into_bytes())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl_seconds <= 0 || self.token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::InvalidValue(format!(
                "auth.token_ttl_seconds must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECONDS, self.token_ttl_seconds
            )));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

fn generate_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Load `configuration.{yaml,toml,json}` from the working directory, then
/// apply `APP_`-prefixed environment overrides (`APP_AUTH__SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}
