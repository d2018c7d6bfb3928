use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Settings for the one-time code password reset flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub code_ttl_minutes: i64,
    pub max_attempts: i32,
    /// Development only: the log notifier prints the code itself.
    pub log_plaintext: bool,
    pub webhook_url: Option<String>,
    pub notify_timeout_secs: u64,
}

/// OpenAI-compatible chat completions endpoint used for listing copy.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub reset: ResetConfig,
    pub llm: LlmConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "estatehub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "estatehub-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let reset = ResetConfig {
            code_ttl_minutes: env_or("RESET_CODE_TTL_MINUTES", 10),
            max_attempts: env_or("RESET_CODE_MAX_ATTEMPTS", 5),
            log_plaintext: env_or("RESET_CODE_LOG_PLAINTEXT", false),
            webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            notify_timeout_secs: env_or("NOTIFY_TIMEOUT_SECS", 10),
        };
        let llm = LlmConfig {
            api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|v| !v.trim().is_empty()),
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.aimlapi.com/v1".into()),
            model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "mistralai/Mistral-7B-Instruct-v0.2".into()),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", 30),
        };
        Ok(Self {
            database_url,
            jwt,
            reset,
            llm,
        })
    }
}
