use std::path::Path;

use reia_models::report::AnalysisReport;
use tracing::info;

use crate::error::EngineError;

/// Write `report` as pretty JSON to `path`, creating parent directories.
/// An existing file is replaced.
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<(), EngineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    info!(
        path = %path.display(),
        properties = report.total_properties,
        "Analysis report written"
    );
    Ok(())
}

/// Read a previously written report back.
pub fn read_report(path: &Path) -> Result<AnalysisReport, EngineError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
