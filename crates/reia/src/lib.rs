//! REIA - Real Estate Investment Analyzer
//!
//! Ranks income properties by capitalization rate and scores them with an
//! OpenAI-compatible completion service, falling back to fixed cap-rate rules
//! whenever the service is unavailable or its reply is unusable.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use reia::models::{demo_portfolio, ReiaConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ReiaConfig::default();
//! let mut engine = reia::build_engine(&config);
//! let report = reia::analyze(&mut engine, &demo_portfolio()).await?;
//! println!("{}", report.summary.average_score);
//! # Ok(())
//! # }
//! ```

pub use reia_client as client;
pub use reia_engine as engine;
pub use reia_models as models;

use std::path::Path;

use anyhow::Context;
use reia_client::CompletionClient;
use reia_engine::{AnalysisEngine, EngineError};
use reia_models::config::ReiaConfig;
use reia_models::property::Property;
use reia_models::report::AnalysisReport;
use tracing::{info, warn};

/// Load configuration from a TOML file. A missing file yields the defaults
/// when `required` is false.
pub fn load_config(path: &Path, required: bool) -> Result<ReiaConfig, anyhow::Error> {
    if !path.exists() && !required {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(ReiaConfig::default());
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: ReiaConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Build an AnalysisEngine from configuration.
///
/// Without an API key the engine still runs, scoring every property with the
/// cap-rate rules.
pub fn build_engine(config: &ReiaConfig) -> AnalysisEngine {
    if !config.analysis.ai_enabled {
        return AnalysisEngine::rules_only(config.analysis.clone());
    }

    match CompletionClient::from_config(config) {
        Ok(client) => AnalysisEngine::new(Some(client), config.analysis.clone()),
        Err(e) => {
            warn!(error = %e, "Completion client unavailable, using rule-based scoring");
            AnalysisEngine::rules_only(config.analysis.clone())
        }
    }
}

/// Analyze `properties` and assemble the persisted report.
pub async fn analyze(
    engine: &mut AnalysisEngine,
    properties: &[Property],
) -> Result<AnalysisReport, EngineError> {
    let results = engine.analyze_properties(properties).await?;
    Ok(AnalysisReport::build(properties, &results))
}

/// Hide a secret for display, keeping only its last four characters.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(10);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(10))
}

/// Text for the `models` command. `from_fallback` marks a catalog that was
/// assumed because the listing request failed.
pub fn render_model_listing(
    available: &[String],
    preferred: &[String],
    from_fallback: bool,
    selected: Option<&str>,
) -> String {
    let mut out = String::new();
    if from_fallback {
        out.push_str("Model listing failed; showing the configured fallback models.\n");
        out.push_str(&format!("Assumed available ({}):\n", available.len()));
    } else {
        out.push_str(&format!("Available models ({}):\n", available.len()));
    }
    for model in available {
        out.push_str(&format!("  {model}\n"));
    }

    out.push_str("\nPreferred models:\n");
    for model in preferred {
        let marker = if available.contains(model) { "yes" } else { "no" };
        out.push_str(&format!("  [{marker:>3}] {model}\n"));
    }

    out.push_str(&format!("\nSelected: {}\n", selected.unwrap_or("none")));
    out
}
