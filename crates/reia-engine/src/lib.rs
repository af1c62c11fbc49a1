pub mod engine;
pub mod error;
pub mod export;
pub mod parser;
pub mod prompts;
pub mod scoring;

pub use engine::AnalysisEngine;
pub use error::EngineError;
pub use export::{read_report, write_report};
pub use parser::{extract_json, parse_recommendations, AiRecommendation};
pub use scoring::{fill_unscored, rule_score};
