use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // Populated from the .env file
    pub database_path: String,
    pub media_path: String,
    pub public_base_url: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub max_upload_size_mb: u64,
    pub bcrypt_cost: u32,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| {
        config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            name
        ))
    })
}

fn require_absolute(name: &str, value: &str) -> Result<(), config::ConfigError> {
    if Path::new(value).is_relative() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: The '{}' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            name, value
        )));
    }
    Ok(())
}

const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 16;
const BYTES_PER_MB: u64 = 1024 * 1024;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

fn parse_upload_size_mb(raw: &str) -> Result<u64, config::ConfigError> {
    let mb = raw.trim().parse::<u64>().map_err(|_| {
        config::ConfigError::Message(
            "FATAL: 'MAX_UPLOAD_SIZE_MB' must be a whole number.".to_string(),
        )
    })?;
    if mb == 0 || mb.checked_mul(BYTES_PER_MB).is_none() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: 'MAX_UPLOAD_SIZE_MB' is out of range ('{}').",
            mb
        )));
    }
    Ok(mb)
}

fn parse_bcrypt_cost(raw: &str) -> Result<u32, config::ConfigError> {
    let cost = raw.trim().parse::<u32>().map_err(|_| {
        config::ConfigError::Message("FATAL: 'BCRYPT_COST' must be a whole number.".to_string())
    })?;
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(config::ConfigError::Message(format!(
            "FATAL: 'BCRYPT_COST' must be between {} and {}.",
            MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }
    Ok(cost)
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let database_path = required_var("DATABASE_PATH")?;
        let media_path = required_var("MEDIA_PATH")?;
        require_absolute("DATABASE_PATH", &database_path)?;
        require_absolute("MEDIA_PATH", &media_path)?;

        // 128 hex characters decode to the 64-byte cookie signing key.
        let session_secret_key = required_var("SESSION_SECRET_KEY")?;
        if session_secret_key.len() != 128
            || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes). Run 'setup_cli secret generate'.".to_string(),
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let max_upload_size_mb = match env::var("MAX_UPLOAD_SIZE_MB") {
            Ok(raw) => parse_upload_size_mb(&raw)?,
            Err(_) => DEFAULT_MAX_UPLOAD_SIZE_MB,
        };
        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => parse_bcrypt_cost(&raw)?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let mut builder = config::Config::builder()
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("media_path", media_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("max_upload_size_mb", max_upload_size_mb as i64)?
            .set_override("bcrypt_cost", i64::from(bcrypt_cost))?;

        // Without an explicit public URL, media links point at the bind address.
        if let Ok(public_base_url) = env::var("PUBLIC_BASE_URL") {
            builder = builder.set_override(
                "public_base_url",
                public_base_url.trim_end_matches('/').to_string(),
            )?;
        } else {
            builder = builder.set_default("public_base_url", "")?;
        }

        let mut config: Config = builder.build()?.try_deserialize()?;
        if config.public_base_url.is_empty() {
            config.public_base_url = format!("http://{}:{}", config.web.host, config.web.port);
        }
        Ok(config)
    }

    /// Full path to the SQLite database file inside its own folder.
    pub fn blog_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("blog").join("blog.db")
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Base URL under which the local asset store's files are served.
    pub fn media_base_url(&self) -> String {
        format!("{}/media", self.public_base_url)
    }
}
