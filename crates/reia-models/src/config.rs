use serde::{Deserialize, Serialize};

/// Top-level configuration for REIA.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ReiaConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

/// Connection settings for the OpenAI-compatible completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Models to use, most preferred first.
    pub preferred_models: Vec<String>,
    /// Assumed availability when the model listing cannot be fetched.
    pub fallback_models: Vec<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Timeout for a single chat completion request in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for the model listing request in seconds.
    pub models_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let preferred_models: Vec<String> = [
            "compound-beta",
            "llama-3.3-70b-versatile",
            "deepseek-r1-distill-llama-70b",
            "llama-3.1-8b-instant",
            "qwen/qwen3-32b",
        ]
        .iter()
        .map(|m| m.to_string())
        .collect();
        let fallback_models = preferred_models.iter().take(2).cloned().collect();

        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            preferred_models,
            fallback_models,
            temperature: 0.7,
            max_tokens: 2000,
            request_timeout_seconds: 30,
            models_timeout_seconds: 10,
        }
    }
}

impl ApiConfig {
    /// Read the API key from the configured environment variable. Blank values
    /// and the template placeholder count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != "your_api_key_here")
    }
}

/// Bounds for the completion client's retry loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per completion.
    pub max_retries: u32,
    /// Rate-limit backoff unit in seconds; attempt `n` waits `base * (n + 1)`.
    pub base_delay_seconds: u64,
    /// Longest single wait in seconds, including server-provided hints.
    pub max_backoff_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_seconds: 2,
            max_backoff_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ask the completion service for scores. When false only rule-based scoring runs.
    pub ai_enabled: bool,
    /// Down payment as a percentage of purchase price, for cash-on-cash return.
    pub down_payment_percent: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            down_payment_percent: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub analysis_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            analysis_file: "real_estate_analysis.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn analysis_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.directory).join(&self.analysis_file)
    }
}
