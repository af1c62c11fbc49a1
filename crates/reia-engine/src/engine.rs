use std::collections::HashSet;
use std::time::Instant;

use reia_client::CompletionClient;
use reia_models::analysis::{AnalysisResult, ScoreSource};
use reia_models::config::AnalysisConfig;
use reia_models::property::Property;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::parser::{extract_json, parse_recommendations, AiRecommendation};
use crate::prompts::analysis_messages;
use crate::scoring::fill_unscored;

/// Ranks properties by cap rate and scores them, with the completion service
/// when it is usable and with fixed cap-rate rules otherwise.
pub struct AnalysisEngine {
    client: Option<CompletionClient>,
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(client: Option<CompletionClient>, config: AnalysisConfig) -> Self {
        Self { client, config }
    }

    /// An engine that never contacts the completion service.
    pub fn rules_only(config: AnalysisConfig) -> Self {
        Self::new(None, config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn client(&self) -> Option<&CompletionClient> {
        self.client.as_ref()
    }

    pub fn client_mut(&mut self) -> Option<&mut CompletionClient> {
        self.client.as_mut()
    }

    /// Analyze `properties`, returning one result per property in rank order.
    ///
    /// Fails only on invalid input. Completion-service problems degrade to
    /// rule-based scoring and are never returned.
    pub async fn analyze_properties(
        &mut self,
        properties: &[Property],
    ) -> Result<Vec<AnalysisResult>, EngineError> {
        let start = Instant::now();
        validate_properties(properties)?;
        info!(count = properties.len(), "Starting property analysis");

        let mut results = rank_properties(properties, self.config.down_payment_percent);
        if results.is_empty() {
            return Ok(results);
        }

        let ai_scored = match (self.config.ai_enabled, self.client.as_mut()) {
            (true, Some(client)) => {
                score_with_ai(client, properties, &mut results, self.config.down_payment_percent)
                    .await
            }
            (true, None) => {
                info!("No completion client configured, using rule-based scores");
                0
            }
            (false, _) => {
                debug!("AI scoring disabled");
                0
            }
        };
        let rule_scored = fill_unscored(&mut results);

        info!(
            count = results.len(),
            ai_scored,
            rule_scored,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(results)
    }
}

/// Reject empty ids, non-finite figures and duplicate ids.
pub fn validate_properties(properties: &[Property]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for property in properties {
        property.validate().map_err(EngineError::InvalidProperty)?;
        if !seen.insert(property.id.as_str()) {
            return Err(EngineError::DuplicateProperty(property.id.clone()));
        }
        if property.purchase_price <= 0.0 {
            warn!(id = %property.id, price = property.purchase_price, "Non-positive purchase price, cap rate will be 0");
        }
    }
    Ok(())
}

/// Compute metrics and assign ranks by descending cap rate. Ties keep input order.
pub fn rank_properties(properties: &[Property], down_payment_percent: f64) -> Vec<AnalysisResult> {
    let mut results: Vec<AnalysisResult> = properties
        .iter()
        .map(|p| AnalysisResult::unscored(p, down_payment_percent))
        .collect();

    results.sort_by(|a, b| b.cap_rate.total_cmp(&a.cap_rate));
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
    results
}

/// Ask the completion service to score every property. Returns how many
/// results received an AI score; failures are logged and yield 0.
async fn score_with_ai(
    client: &mut CompletionClient,
    properties: &[Property],
    results: &mut [AnalysisResult],
    down_payment_percent: f64,
) -> usize {
    let messages = analysis_messages(properties, down_payment_percent);

    let response = match client.send_completion(&messages, None).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "AI scoring unavailable, falling back to rule-based scores");
            return 0;
        }
    };

    let Some(content) = response.content() else {
        warn!(model = %response.model, "Completion had no choices, falling back to rule-based scores");
        return 0;
    };

    let Some(value) = extract_json(content) else {
        warn!("Unusable AI reply, falling back to rule-based scores");
        return 0;
    };

    let recommendations = parse_recommendations(&value);
    let applied = apply_recommendations(results, &recommendations);
    info!(
        returned = recommendations.len(),
        applied,
        "Applied AI recommendations"
    );
    applied
}

/// Join AI entries to results by property id. Entries with an unknown id, no
/// numeric score or an empty recommendation are skipped; the first entry for
/// an id wins.
pub fn apply_recommendations(
    results: &mut [AnalysisResult],
    recommendations: &[AiRecommendation],
) -> usize {
    let mut applied = 0;
    for rec in recommendations {
        let Some(score) = rec.score else {
            debug!(property_id = %rec.property_id, "AI entry without score ignored");
            continue;
        };
        if rec.recommendation.is_empty() {
            debug!(property_id = %rec.property_id, "AI entry without recommendation ignored");
            continue;
        }
        match results
            .iter_mut()
            .find(|r| r.property_id == rec.property_id && !r.is_scored())
        {
            Some(result) => {
                result.apply_score(score, rec.recommendation.clone(), ScoreSource::Ai);
                applied += 1;
            }
            None => debug!(property_id = %rec.property_id, "AI entry matched no unscored result"),
        }
    }
    applied
}
