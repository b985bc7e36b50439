use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from forecast_synth.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub llm: LlmConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Which model backend the forecasters call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted OpenAI-compatible API (OpenRouter by default)
    Api,
    /// Local OpenAI-compatible server
    Local,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" => Ok(BackendKind::Api),
            "local" => Ok(BackendKind::Local),
            other => Err(format!("unknown backend '{other}' (expected api or local)")),
        }
    }
}

/// Forecasting behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub num_runs_per_question: usize,
    /// Cap on concurrent external model calls across the whole process
    pub concurrent_requests_limit: usize,
    pub forecast_backend: BackendKind,
    pub default_model: String,
    pub default_temperature: f32,
    pub use_research: bool,
    pub research_model: String,
    pub research_temperature: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            num_runs_per_question: 1,
            concurrent_requests_limit: 5,
            forecast_backend: BackendKind::Api,
            default_model: "openai/gpt-5.2".to_string(),
            default_temperature: 0.3,
            use_research: true,
            research_model: "openai/o4-mini-deep-research".to_string(),
            research_temperature: 0.3,
        }
    }
}

/// Model client behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    /// Models that reject an explicit temperature parameter
    pub models_without_temperature: Vec<String>,
    pub local_model: String,
    pub local_max_tokens: u32,
    pub local_temperature: f32,
    pub local_max_retries: u32,
    /// Append a `\no_think` directive to local prompts
    pub local_no_think: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 500,
            request_timeout_ms: 300_000,
            models_without_temperature: vec![
                "openai/o4-mini-deep-research".to_string(),
                "anthropic/claude-sonnet-4.5".to_string(),
            ],
            local_model: "Qwen/Qwen3-32B".to_string(),
            local_max_tokens: 5000,
            local_temperature: 0.2,
            local_max_retries: 3,
            local_no_think: false,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub local_llm_base_url: String,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openai_api_key: None,
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            local_llm_base_url: "http://127.0.0.1:8000/v1".to_string(),
            log_level: "forecast_synth=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            openrouter_api_key: lookup("OPENROUTER_API_KEY").filter(|v| !v.is_empty()),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()),
            openrouter_base_url: lookup("OPENROUTER_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            local_llm_base_url: lookup("LOCAL_LLM_BASE_URL").unwrap_or(defaults.local_llm_base_url),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Key for the hosted API: OpenRouter first, then OpenAI
    pub fn api_key(&self) -> Option<&str> {
        self.openrouter_api_key
            .as_deref()
            .or(self.openai_api_key.as_deref())
    }
}

/// Load `FORECAST_ENV_FILE` if set, otherwise `./.env` when present.
/// Variables already in the environment win.
pub fn load_env_file() {
    if let Ok(env_path) = std::env::var("FORECAST_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::dotenv();
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses FORECAST_SYNTH_CONFIG environment variable or defaults to "forecast_synth.toml"
    pub fn load() -> anyhow::Result<Self> {
        load_env_file();

        let config_path = std::env::var("FORECAST_SYNTH_CONFIG")
            .unwrap_or_else(|_| "forecast_synth.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment-style overrides (env-first)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(runs) = lookup("FORECAST_RUNS").and_then(|v| v.parse().ok()) {
            self.bot.num_runs_per_question = runs;
        }
        if let Some(limit) = lookup("FORECAST_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.bot.concurrent_requests_limit = limit;
        }
        if let Some(backend) = lookup("FORECAST_BACKEND").and_then(|v| v.parse().ok()) {
            self.bot.forecast_backend = backend;
        }
        if let Some(model) = lookup("FORECAST_MODEL") {
            self.bot.default_model = model;
        }
        if let Some(temp) = lookup("FORECAST_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.bot.default_temperature = temp;
        }
        if let Some(research) = lookup("FORECAST_USE_RESEARCH") {
            self.bot.use_research = research == "1" || research.eq_ignore_ascii_case("true");
        }
        if let Some(model) = lookup("RESEARCH_MODEL") {
            self.bot.research_model = model;
        }
        if let Some(temp) = lookup("RESEARCH_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.bot.research_temperature = temp;
        }
        if let Some(retries) = lookup("LLM_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.llm.max_retries = retries;
        }
        if let Some(timeout) = lookup("LLM_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.llm.request_timeout_ms = timeout;
        }
        if let Some(model) = lookup("LOCAL_LLM_MODEL") {
            self.llm.local_model = model;
        }
        if let Some(no_think) = lookup("LOCAL_LLM_NO_THINK") {
            self.llm.local_no_think = no_think == "1" || no_think.eq_ignore_ascii_case("true");
        }
    }

    /// Validate the configuration, clamping recoverable values
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.bot.num_runs_per_question == 0 {
            tracing::warn!("num_runs_per_question is 0, using 1");
            self.bot.num_runs_per_question = 1;
        }
        if self.bot.concurrent_requests_limit == 0 {
            tracing::warn!("concurrent_requests_limit is 0, using 1");
            self.bot.concurrent_requests_limit = 1;
        }

        for (name, retries) in [
            ("max_retries", &mut self.llm.max_retries),
            ("local_max_retries", &mut self.llm.local_max_retries),
        ] {
            if *retries == 0 {
                *retries = 1;
            } else if *retries > 10 {
                tracing::warn!("{} {} exceeds max 10, clamping to 10", name, retries);
                *retries = 10;
            }
        }

        for (name, temp) in [
            ("default_temperature", self.bot.default_temperature),
            ("research_temperature", self.bot.research_temperature),
            ("local_temperature", self.llm.local_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                anyhow::bail!("{} must be between 0.0 and 2.0, got {}", name, temp);
            }
        }

        if self.bot.default_model.trim().is_empty() {
            anyhow::bail!("default_model must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_bot_behavior() {
        let config = Config::default();
        assert_eq!(config.bot.num_runs_per_question, 1);
        assert_eq!(config.bot.concurrent_requests_limit, 5);
        assert_eq!(config.llm.max_retries, 5);
        assert_eq!(config.llm.local_max_tokens, 5000);
        assert_eq!(config.bot.forecast_backend, BackendKind::Api);
    }

    #[test]
    fn toml_sections_are_optional() {
        let config: Config = toml::from_str("[bot]\nnum_runs_per_question = 5\n").unwrap();
        assert_eq!(config.bot.num_runs_per_question, 5);
        assert_eq!(config.bot.default_temperature, 0.3);
        assert_eq!(config.llm.local_max_retries, 3);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("FORECAST_RUNS", "3"),
            ("FORECAST_BACKEND", "local"),
            ("LOCAL_LLM_NO_THINK", "true"),
            ("FORECAST_TEMPERATURE", "not-a-number"),
        ]));
        assert_eq!(config.bot.num_runs_per_question, 3);
        assert_eq!(config.bot.forecast_backend, BackendKind::Local);
        assert!(config.llm.local_no_think);
        assert_eq!(config.bot.default_temperature, 0.3);
    }

    #[test]
    fn validate_clamps_and_rejects() {
        let mut config = Config::default();
        config.bot.num_runs_per_question = 0;
        config.llm.max_retries = 50;
        config.validate().unwrap();
        assert_eq!(config.bot.num_runs_per_question, 1);
        assert_eq!(config.llm.max_retries, 10);

        config.bot.default_temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_prefers_openrouter() {
        let runtime = RuntimeConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENROUTER_API_KEY", "sk-or"),
        ]));
        assert_eq!(runtime.api_key(), Some("sk-or"));
        let runtime = RuntimeConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(runtime.api_key(), Some("sk-openai"));
    }
}
