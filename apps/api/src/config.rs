use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When set, generation jobs go through a Redis list instead of the in-process channel.
    pub redis_url: Option<String>,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub ai_provider: String,
    pub gemini_api_key: String,
    pub ollama_host: String,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            secret_key: require_env("SECRET_KEY")?,
            access_token_expire_minutes: parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            ai_provider: env_or("AI_PROVIDER", "ollama").to_lowercase(),
            gemini_api_key: env_or("GEMINI_API_KEY", ""),
            ollama_host: env_or("OLLAMA_HOST", "http://localhost:11434"),
            ai_model: env_or("AI_MODEL", "llama3"),
            ai_timeout_secs: parse_env("AI_TIMEOUT_SECS", 120)?,
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            max_upload_bytes: parse_env::<usize>("MAX_UPLOAD_MB", 10)? * 1024 * 1024,
            cors_origins: split_origins(&env_or(
                "BACKEND_CORS_ORIGINS",
                "http://localhost:5173,http://localhost:3000",
            )),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
