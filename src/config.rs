//! Configuration management for Deep Research.
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! first by the binary when present):
//! - `OPENROUTER_API_KEY` - Required. API key for the model-routing provider.
//! - `TAVILY_API_KEY` - Required. API key for the search provider.
//! - `SITE_URL` - Optional. Sent as `HTTP-Referer`. Defaults to `http://localhost:3000`.
//! - `APP_TITLE` - Optional. Sent as `X-Title`. Defaults to `Deep Research Agent`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Maximum model calls per request. Defaults to `10`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Upper bound for a single remote call. Defaults to `120`.
//! - `GENERAL_MODEL`, `REASONING_MODEL`, `CODE_MODEL` - Optional. Model id overrides.

use std::time::Duration;

use thiserror::Error;

use crate::llm::ModelProfiles;

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_TITLE: &str = "Deep Research Agent";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub openrouter_api_key: String,

    /// Tavily API key
    pub tavily_api_key: String,

    /// Attribution URL for outbound model requests
    pub site_url: String,

    /// Attribution title for outbound model requests
    pub app_title: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum model calls for one control loop run
    pub max_iterations: usize,

    /// Upper bound for a single remote call (or a single streamed event)
    pub request_timeout: Duration,

    /// Model profiles available to the gateway
    pub profiles: ModelProfiles,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if either API key is not set and
    /// `ConfigError::InvalidValue` for unparsable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openrouter_api_key = require_env("OPENROUTER_API_KEY")?;
        let tavily_api_key = require_env("TAVILY_API_KEY")?;

        let site_url = std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());
        let app_title =
            std::env::var("APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .ok()
            .map(|v| parse_max_iterations(&v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let mut profiles = ModelProfiles::default();
        for (profile, var) in [
            ("general", "GENERAL_MODEL"),
            ("reasoning", "REASONING_MODEL"),
            ("code", "CODE_MODEL"),
        ] {
            if let Ok(model_id) = std::env::var(var) {
                profiles = profiles.with_model_id(profile, model_id);
            }
        }

        Ok(Self {
            openrouter_api_key,
            tavily_api_key,
            site_url,
            app_title,
            host,
            port,
            max_iterations,
            request_timeout: Duration::from_secs(request_timeout_secs),
            profiles,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(openrouter_api_key: String, tavily_api_key: String) -> Self {
        Self {
            openrouter_api_key,
            tavily_api_key,
            site_url: DEFAULT_SITE_URL.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            request_timeout: Duration::from_secs(120),
            profiles: ModelProfiles::default(),
        }
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn parse_max_iterations(value: &str) -> Result<usize, ConfigError> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue(
            "MAX_ITERATIONS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(parsed)
}
