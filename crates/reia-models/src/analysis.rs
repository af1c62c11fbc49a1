use serde::{Deserialize, Serialize};

use crate::property::Property;

/// Where a result's score and recommendation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Returned by the remote completion model.
    Ai,
    /// Assigned by the deterministic cap-rate thresholds.
    Rules,
}

/// Per-property analysis output. Rank, score and recommendation are filled in
/// by the engine after the derived metrics are computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub property_id: String,
    pub noi: f64,
    pub cap_rate: f64,
    pub cash_on_cash_return: f64,
    /// 1 = highest cap rate. Zero until ranked.
    pub rank: usize,
    pub recommendation: String,
    /// 0.0 to 100.0.
    pub score: f64,
    /// `None` until a scorer has populated this result.
    pub source: Option<ScoreSource>,
}

impl AnalysisResult {
    /// Build an unranked, unscored result from a property's derived metrics.
    pub fn unscored(property: &Property, down_payment_percent: f64) -> Self {
        Self {
            property_id: property.id.clone(),
            noi: property.noi(),
            cap_rate: property.cap_rate(),
            cash_on_cash_return: property.cash_on_cash_return(down_payment_percent),
            rank: 0,
            recommendation: String::new(),
            score: 0.0,
            source: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.source.is_some()
    }

    /// Record a score and recommendation. Scores are clamped to 0..=100.
    pub fn apply_score(&mut self, score: f64, recommendation: impl Into<String>, source: ScoreSource) {
        self.score = score.clamp(0.0, 100.0);
        self.recommendation = recommendation.into();
        self.source = Some(source);
    }
}
