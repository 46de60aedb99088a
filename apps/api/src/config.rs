use anyhow::{Context, Result};

const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_EMBEDDING_MODEL: &str = "minishlab/potion-base-8M";
const DEFAULT_EMAIL_DOMAIN: &str = "@iu.edu";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub send_otp_url: String,
    pub verify_otp_url: String,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    /// Local model folder or Hugging Face Hub id of a Model2Vec model.
    pub embedding_model: String,
    /// Suffix every OTP email must end with, e.g. `@iu.edu`.
    pub allowed_email_domain: String,
    pub session_idle_ttl_secs: u64,
    pub analysis_delay_ms: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            send_otp_url: require_env("SEND_OTP_URL")?,
            verify_otp_url: require_env("VERIFY_OTP_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_url: env_or("OPENAI_API_URL", DEFAULT_CHAT_URL),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_CHAT_MODEL),
            embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            allowed_email_domain: env_or("ALLOWED_EMAIL_DOMAIN", DEFAULT_EMAIL_DOMAIN),
            session_idle_ttl_secs: parse_env("SESSION_IDLE_TTL_SECS", 3600)?,
            analysis_delay_ms: parse_env("ANALYSIS_DELAY_MS", 0)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
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
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration pointing at loopback endpoints, for handler tests.
    pub fn for_tests() -> Self {
        Config {
            send_otp_url: "http://127.0.0.1:9/send".to_string(),
            verify_otp_url: "http://127.0.0.1:9/verify".to_string(),
            openai_api_key: "test-key".to_string(),
            openai_api_url: "http://127.0.0.1:9/chat".to_string(),
            openai_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            allowed_email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            session_idle_ttl_secs: 3600,
            analysis_delay_ms: 0,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
