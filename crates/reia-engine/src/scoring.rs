use reia_models::analysis::{AnalysisResult, ScoreSource};

/// Cap-rate bands, highest first. Each bound is exclusive.
const BANDS: [(f64, f64, &str); 3] = [
    (8.0, 90.0, "Strong buy – Excellent cap rate"),
    (6.0, 75.0, "Buy – Good cap rate"),
    (4.0, 60.0, "Hold – Moderate cap rate"),
];

const FLOOR: (f64, &str) = (40.0, "Pass – Low cap rate");

/// Deterministic score and recommendation for a cap rate (in percent).
pub fn rule_score(cap_rate: f64) -> (f64, &'static str) {
    BANDS
        .iter()
        .find(|(bound, _, _)| cap_rate > *bound)
        .map(|(_, score, text)| (*score, *text))
        .unwrap_or(FLOOR)
}

/// Apply rule-based scoring to `result`, replacing whatever it held.
pub fn apply_rules(result: &mut AnalysisResult) {
    let (score, recommendation) = rule_score(result.cap_rate);
    result.apply_score(score, recommendation, ScoreSource::Rules);
}

/// Apply rule-based scoring to every result not yet scored. Returns how many
/// were filled in.
pub fn fill_unscored(results: &mut [AnalysisResult]) -> usize {
    let mut filled = 0;
    for result in results.iter_mut().filter(|r| !r.is_scored()) {
        apply_rules(result);
        filled += 1;
    }
    filled
}
