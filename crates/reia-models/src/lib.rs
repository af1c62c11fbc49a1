pub mod analysis;
pub mod chat;
pub mod config;
pub mod property;
pub mod report;

pub use analysis::{AnalysisResult, ScoreSource};
pub use chat::{ChatMessage, ChatRequest, ChatResponse, Choice, ModelEntry, ModelList, Usage};
pub use config::{AnalysisConfig, ApiConfig, OutputConfig, ReiaConfig, RetryConfig};
pub use property::{demo_portfolio, Property};
pub use report::{AnalysisReport, AnalysisSummary, ReportEntry, RiskLevel};
