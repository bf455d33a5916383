use crate::models::RunReport;
use super::FormatError;

/// Serialize a RunReport to pretty-printed JSON
pub fn to_json(report: &RunReport) -> Result<String, FormatError> {
    serde_json::to_string_pretty(report).map_err(FormatError::from)
}
