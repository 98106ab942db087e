use crate::errors::RunFailure;

pub const NO_JSON_FOUND: &str = "Failed to find JSON in LLM response";

/// Best-effort JSON extraction: the substring from the first `{` to the last
/// `}` is parsed as the model's output object. Not a balanced-brace scan;
/// stray braces in surrounding prose break it.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, RunFailure> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(s), Some(e)) if e > s => (s, e),
        _ => return Err(RunFailure::Extraction(NO_JSON_FOUND.to_string())),
    };

    serde_json::from_str(&raw[start..=end]).map_err(|e| {
        RunFailure::Extraction(format!("Failed to parse JSON in LLM response: {}", e))
    })
}
