//! Configuration management for the quiz agent.
//!
//! Both entry points read their settings from environment variables once at
//! startup and pass the resulting immutable structs down by reference.
//!
//! Agent flow (`quiz-agent`):
//! - `MODEL_API_KEY` - Required. Bearer token for the model endpoint.
//! - `MODEL_API_BASE` - Optional. OpenAI-compatible base URL. Defaults to Gemini's compatibility endpoint.
//! - `AGENT_MODEL` - Optional. Defaults to `gemini-2.5-flash`.
//! - `STUDENT_SECRET` - Required. Shared secret expected on `POST /solve`.
//! - `MAX_ITERATIONS` - Optional. Agent loop budget, at least `1`. Defaults to `10`.
//! - `CORRECTION_RETRIES` - Optional. Re-prompts after a malformed final answer. Defaults to `0`.
//! - `FETCH_TIMEOUT_SECS` / `SUBMIT_TIMEOUT_SECS` - Optional. Default `30`.
//!
//! Q&A flow (`qa-server`):
//! - `AIPROXY_TOKEN` - Required. Bearer token for the AI proxy.
//! - `AIPROXY_URL` - Optional. OpenAI-compatible base URL of the proxy.
//! - `QA_MODEL` - Optional. Defaults to `gpt-4o-mini`.
//! - `UPLOAD_DIR` - Optional. Where uploaded files are stored. Defaults to `/data`.
//!
//! Shared:
//! - `HOST` / `PORT` - Optional. Default `0.0.0.0:8000`.
//! - `LLM_TEMPERATURE` - Optional. Defaults to `0.1`.
//! - `LLM_TIMEOUT_SECS` - Optional. Defaults to `30`.
//! - `SCRATCH_DIR` - Optional. Download directory for tools. Defaults to `downloads`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Subprocess tool timeout. Defaults to `60`.
//! - `PYTHON_BIN` / `PRETTIER_BIN` - Optional. External binaries used by tools.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Connection settings for one OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Bearer token
    pub api_key: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Sampling temperature (kept low for deterministic tool selection)
    pub temperature: f32,

    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings shared by every tool handler.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Shared directory for downloaded files and analysis scripts
    pub scratch_dir: PathBuf,

    /// Wall-clock limit for subprocess tools and downloads
    pub timeout: Duration,

    /// Interpreter used by `run_python_analysis`
    pub python_bin: String,

    /// Formatter used by `format_file`
    pub prettier_bin: String,
}

impl ToolConfig {
    pub fn new(scratch_dir: PathBuf) -> Self {
        Self {
            scratch_dir,
            timeout: Duration::from_secs(60),
            python_bin: "python3".to_string(),
            prettier_bin: "prettier".to_string(),
        }
    }
}

/// Configuration of the URL-driven agent server.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub tools: ToolConfig,

    /// Secret callers must present on `POST /solve`
    pub shared_secret: String,

    /// Maximum model round-trips per task
    pub max_iterations: usize,

    /// How many times a malformed final answer is sent back for correction
    pub correction_retries: usize,

    /// Page fetch timeout
    pub fetch_timeout: Duration,

    /// Submission POST timeout
    pub submit_timeout: Duration,
}

/// Configuration of the synchronous Q&A server.
#[derive(Debug, Clone)]
pub struct QaConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub tools: ToolConfig,

    /// Directory uploaded files are persisted into
    pub upload_dir: PathBuf,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `MODEL_API_KEY` or
    /// `STUDENT_SECRET` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let gateway = GatewayConfig {
            api_base: env.or(
                "MODEL_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta/openai",
            ),
            api_key: env.required("MODEL_API_KEY")?,
            model: env.or("AGENT_MODEL", "gemini-2.5-flash"),
            temperature: env.parsed("LLM_TEMPERATURE", 0.1)?,
            timeout: env.secs("LLM_TIMEOUT_SECS", 30)?,
        };

        Ok(Self {
            server: env.server()?,
            gateway,
            tools: env.tools()?,
            shared_secret: env.required("STUDENT_SECRET")?,
            max_iterations: env.at_least_one("MAX_ITERATIONS", 10)?,
            correction_retries: env.parsed("CORRECTION_RETRIES", 0)?,
            fetch_timeout: env.secs("FETCH_TIMEOUT_SECS", 30)?,
            submit_timeout: env.secs("SUBMIT_TIMEOUT_SECS", 30)?,
        })
    }
}

impl QaConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `AIPROXY_TOKEN` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let gateway = GatewayConfig {
            api_base: env.or("AIPROXY_URL", "https://aiproxy.sanand.workers.dev/openai/v1"),
            api_key: env.required("AIPROXY_TOKEN")?,
            model: env.or("QA_MODEL", "gpt-4o-mini"),
            temperature: env.parsed("LLM_TEMPERATURE", 0.1)?,
            timeout: env.secs("LLM_TIMEOUT_SECS", 30)?,
        };

        Ok(Self {
            server: env.server()?,
            gateway,
            tools: env.tools()?,
            upload_dir: PathBuf::from(env.or("UPLOAD_DIR", "/data")),
        })
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
            None => Ok(default),
        }
    }

    fn at_least_one(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        match self.parsed(key, default)? {
            0 => Err(ConfigError::InvalidValue(
                key.to_string(),
                "must be at least 1".to_string(),
            )),
            n => Ok(n),
        }
    }

    fn secs(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        self.parsed(key, default).map(Duration::from_secs)
    }

    fn server(&self) -> Result<ServerConfig, ConfigError> {
        Ok(ServerConfig {
            host: self.or("HOST", "0.0.0.0"),
            port: self.parsed("PORT", 8000)?,
        })
    }

    fn tools(&self) -> Result<ToolConfig, ConfigError> {
        Ok(ToolConfig {
            scratch_dir: PathBuf::from(self.or("SCRATCH_DIR", "downloads")),
            timeout: self.secs("TOOL_TIMEOUT_SECS", 60)?,
            python_bin: self.or("PYTHON_BIN", "python3"),
            prettier_bin: self.or("PRETTIER_BIN", "prettier"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn agent_config_requires_model_key() {
        let err = AgentConfig::from_lookup(lookup(&[("STUDENT_SECRET", "s3cret")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "MODEL_API_KEY"));
    }

    #[test]
    fn agent_config_requires_shared_secret() {
        let err = AgentConfig::from_lookup(lookup(&[("MODEL_API_KEY", "key")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STUDENT_SECRET"));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let err = QaConfig::from_lookup(lookup(&[("AIPROXY_TOKEN", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "AIPROXY_TOKEN"));
    }

    #[test]
    fn agent_config_defaults() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("MODEL_API_KEY", "key"),
            ("STUDENT_SECRET", "s3cret"),
        ]))
        .expect("config");

        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.correction_retries, 0);
        assert_eq!(config.gateway.model, "gemini-2.5-flash");
        assert!((config.gateway.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.server.addr(), "0.0.0.0:8000");
        assert_eq!(config.tools.scratch_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = AgentConfig::from_lookup(lookup(&[
            ("MODEL_API_KEY", "key"),
            ("STUDENT_SECRET", "s3cret"),
            ("MAX_ITERATIONS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ITERATIONS"));
    }

    #[test]
    fn zero_iteration_budget_is_rejected() {
        let err = AgentConfig::from_lookup(lookup(&[
            ("MODEL_API_KEY", "key"),
            ("STUDENT_SECRET", "s3cret"),
            ("MAX_ITERATIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ITERATIONS"));
    }

    #[test]
    fn qa_config_overrides() {
        let config = QaConfig::from_lookup(lookup(&[
            ("AIPROXY_TOKEN", "tok"),
            ("QA_MODEL", "gpt-4o"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("PORT", "9001"),
        ]))
        .expect("config");

        assert_eq!(config.gateway.model, "gpt-4o");
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/uploads"));
        assert_eq!(config.server.port, 9001);
    }

    #[test]
    fn gateway_debug_redacts_key() {
        let config = QaConfig::from_lookup(lookup(&[("AIPROXY_TOKEN", "very-secret-token")]))
            .expect("config");
        let rendered = format!("{:?}", config.gateway);
        assert!(!rendered.contains("very-secret-token"));
    }
}
