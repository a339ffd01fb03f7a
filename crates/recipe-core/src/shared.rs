//! Shared types used across the recipe assistant crates.

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_INSTANCE_NAME: &str = "AZURE_OPENAI_API_INSTANCE_NAME";
pub const ENV_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_API_DEPLOYMENT_NAME";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_PORT: &str = "PORT";
const ENV_CONFIG_PATH: &str = "RECIPE_CONFIG";

/// Azure OpenAI API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// One user turn and the AI reply to it. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub ai_response: String,
    pub session_id: String,
}

impl Exchange {
    /// Creates an exchange stamped with a fresh id and the current time.
    pub fn new(
        session_id: impl Into<String>,
        user_message: impl Into<String>,
        ai_response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            session_id: session_id.into(),
        }
    }
}

/// Flattened audit entry written to the daily trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user_input: String,
    pub ai_output: String,
    /// Milliseconds from request receipt to AI reply.
    pub processing_time_ms: u64,
    pub model: String,
}

impl TraceRecord {
    pub fn from_exchange(exchange: &Exchange, processing_time: Duration, model: &str) -> Self {
        Self {
            timestamp: exchange.timestamp,
            session_id: exchange.session_id.clone(),
            user_input: exchange.user_message.clone(),
            ai_output: exchange.ai_response.clone(),
            processing_time_ms: u64::try_from(processing_time.as_millis()).unwrap_or(u64::MAX),
            model: model.to_string(),
        }
    }
}

/// Generates a session id of the form `session_<unix-millis>_<9 alphanumerics>`.
pub fn new_session_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Azure OpenAI settings as loaded. Required fields stay optional here so that
/// [`CoreConfig::provider_settings`] can report every missing one at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    pub api_version: String,
    /// Overrides `https://{instance_name}.openai.azure.com` (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Validated provider settings handed to the model client.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub instance_name: String,
    pub deployment_name: String,
    pub api_version: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("instance_name", &self.instance_name)
            .field("deployment_name", &self.deployment_name)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Global application configuration (gateway + provider). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Directory holding the daily trace files.
    pub logs_dir: String,
    pub azure: AzureSettings,
}

impl CoreConfig {
    /// Load config from the process environment. See [`CoreConfig::load_from_vars`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_vars(std::env::vars().collect())
    }

    /// Load config from defaults, an optional TOML file, and the given variables.
    ///
    /// Precedence (lowest to highest): defaults, `RECIPE_CONFIG` file (default
    /// `config/gateway.toml`), `RECIPE_*` variables (`RECIPE_AZURE__API_KEY` style
    /// nesting), then the well-known `AZURE_OPENAI_*` and `PORT` variables.
    pub fn load_from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let config_path = vars
            .get(ENV_CONFIG_PATH)
            .cloned()
            .unwrap_or_else(|| "config/gateway".to_string());

        let built = config::Config::builder()
            .set_default("app_name", "Recipe Assistant")?
            .set_default("port", 3000_i64)?
            .set_default("logs_dir", "./logs")?
            .set_default("azure.api_version", DEFAULT_API_VERSION)?
            .set_default("azure.temperature", 0.7_f64)?
            .set_default("azure.max_tokens", 1000_i64)?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RECIPE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(vars.clone())),
            )
            .set_override_option("azure.api_key", non_blank(&vars, ENV_API_KEY))?
            .set_override_option("azure.instance_name", non_blank(&vars, ENV_INSTANCE_NAME))?
            .set_override_option("azure.deployment_name", non_blank(&vars, ENV_DEPLOYMENT_NAME))?
            .set_override_option("azure.api_version", non_blank(&vars, ENV_API_VERSION))?
            .set_override_option("port", non_blank(&vars, ENV_PORT))?
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Checks that the credential, instance, and deployment are present.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigError> {
        let mut missing = Vec::new();
        let api_key = required(&self.azure.api_key, ENV_API_KEY, &mut missing);
        let instance_name = required(&self.azure.instance_name, ENV_INSTANCE_NAME, &mut missing);
        let deployment_name =
            required(&self.azure.deployment_name, ENV_DEPLOYMENT_NAME, &mut missing);

        match (api_key, instance_name, deployment_name) {
            (Some(api_key), Some(instance_name), Some(deployment_name)) => Ok(ProviderSettings {
                api_key,
                instance_name,
                deployment_name,
                api_version: self.azure.api_version.clone(),
                base_url: self.azure.base_url.clone(),
                temperature: self.azure.temperature,
                max_tokens: self.azure.max_tokens,
            }),
            _ => Err(ConfigError::MissingSettings(missing)),
        }
    }
}

fn non_blank(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).filter(|v| !v.trim().is_empty()).cloned()
}

fn required(value: &Option<String>, key: &str, missing: &mut Vec<String>) -> Option<String> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Some(v.to_string()),
        None => {
            missing.push(key.to_string());
            None
        }
    }
}
