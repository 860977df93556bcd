use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub tutor: TutorSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Test,
    Prod,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("prod") => Environment::Prod,
            Ok("test") => Environment::Test,
            _ => Environment::Dev,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: String,
    pub text_model: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub generation_limit: u32,
    pub generation_window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct TutorSettings {
    /// How many prior messages are replayed to the model on each chat turn.
    pub chat_history_limit: i64,
}

impl TutorConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::from_env();
        let is_prod = environment == Environment::Prod;

        let provider = match get_env("LLM_PROVIDER", Some("gemini"), is_prod)?.as_str() {
            "mock" => LlmProviderKind::Mock,
            "gemini" => LlmProviderKind::Gemini,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "LLM_PROVIDER must be 'gemini' or 'mock', got '{}'",
                    other
                )))
            }
        };

        // The mock provider needs no key; everything else does.
        let api_key = match provider {
            LlmProviderKind::Gemini => get_env("GOOGLE_API_KEY", None, is_prod)?,
            LlmProviderKind::Mock => env::var("GOOGLE_API_KEY").unwrap_or_default(),
        };

        Ok(TutorConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("tutor-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10, is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1, is_prod)?,
            },
            llm: LlmConfig {
                provider,
                api_key,
                text_model: get_env("TUTOR_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL), is_prod)?,
                timeout_seconds: parse_env("LLM_TIMEOUT_SECONDS", 60, is_prod)?,
                max_retries: parse_env("LLM_MAX_RETRIES", 2, is_prod)?,
                temperature: parse_env("LLM_TEMPERATURE", 0.7, is_prod)?,
            },
            auth: AuthConfig {
                jwt_secret: get_env("JWT_SECRET", None, is_prod)?,
                issuer: env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            },
            security: SecurityConfig {
                allowed_origins: split_list(&get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?),
            },
            rate_limit: RateLimitConfig {
                generation_limit: parse_env("GENERATION_RATE_LIMIT", 20, is_prod)?,
                generation_window_seconds: parse_env(
                    "GENERATION_RATE_WINDOW_SECONDS",
                    60,
                    is_prod,
                )?,
            },
            tutor: TutorSettings {
                chat_history_limit: parse_env("CHAT_HISTORY_LIMIT", 20, is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(&default.to_string()), is_prod)?;
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
