//! Rendering of run summaries for the command line.

use crate::cli::OutputFormat;
use crate::models::FetchPublishResult;

/// Render `result` as the human-readable summary or as pretty-printed JSON.
pub fn format_result(
    result: &FetchPublishResult,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(result.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(result),
    }
}
