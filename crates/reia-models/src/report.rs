use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::property::Property;

/// Timestamp layout expected by the dashboard: local time, microseconds, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Low
        } else if score >= 60.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// One row of `analysis_results` in the persisted report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub property_id: String,
    pub address: String,
    pub noi: f64,
    pub cap_rate: f64,
    pub rank: usize,
    pub score: f64,
    pub recommendation: String,
    pub risk_level: RiskLevel,
}

/// Portfolio-level aggregates over a set of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub best_cap_rate: f64,
    pub average_cap_rate: f64,
    pub total_noi: f64,
    /// Identifier of the rank-1 property. `None` for an empty analysis.
    pub top_recommendation: Option<String>,
    /// Count of results per risk level. Levels with no results are omitted.
    pub risk_distribution: BTreeMap<String, usize>,
    pub total_investment: f64,
    pub average_score: f64,
}

impl AnalysisSummary {
    pub fn from_results(properties: &[Property], results: &[AnalysisResult]) -> Self {
        let count = results.len();
        let mean = |total: f64| if count == 0 { 0.0 } else { total / count as f64 };

        let best_cap_rate = results
            .iter()
            .map(|r| r.cap_rate)
            .fold(None, |best: Option<f64>, rate| {
                Some(best.map_or(rate, |b| b.max(rate)))
            })
            .unwrap_or(0.0);

        let mut risk_distribution = BTreeMap::new();
        for result in results {
            let level = RiskLevel::from_score(result.score);
            *risk_distribution.entry(level.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            best_cap_rate,
            average_cap_rate: mean(results.iter().map(|r| r.cap_rate).sum()),
            total_noi: results.iter().map(|r| r.noi).sum(),
            top_recommendation: results
                .iter()
                .find(|r| r.rank == 1)
                .map(|r| r.property_id.clone()),
            risk_distribution,
            total_investment: properties.iter().map(|p| p.purchase_price).sum(),
            average_score: mean(results.iter().map(|r| r.score).sum()),
        }
    }
}

/// The document persisted for the visualization dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub timestamp: String,
    pub total_properties: usize,
    pub analysis_results: Vec<ReportEntry>,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Build a report stamped with the current local time.
    pub fn build(properties: &[Property], results: &[AnalysisResult]) -> Self {
        Self::build_at(properties, results, Local::now().naive_local())
    }

    pub fn build_at(
        properties: &[Property],
        results: &[AnalysisResult],
        at: NaiveDateTime,
    ) -> Self {
        let analysis_results = results
            .iter()
            .map(|r| ReportEntry {
                property_id: r.property_id.clone(),
                address: properties
                    .iter()
                    .find(|p| p.id == r.property_id)
                    .map(|p| p.address.clone())
                    .unwrap_or_default(),
                noi: r.noi,
                cap_rate: r.cap_rate,
                rank: r.rank,
                score: r.score,
                recommendation: r.recommendation.clone(),
                risk_level: RiskLevel::from_score(r.score),
            })
            .collect();

        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            total_properties: properties.len(),
            analysis_results,
            summary: AnalysisSummary::from_results(properties, results),
        }
    }
}
