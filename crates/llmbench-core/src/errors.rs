use std::fmt;

/// Per-example pipeline failures. These are recovered inside the run
/// executor and persisted as the row's `error` string; they never propagate
/// out of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// Transport or API failure from a completion provider, message captured
    /// verbatim.
    Provider(String),
    /// No JSON object substring in the response, or the substring did not
    /// parse.
    Extraction(String),
    /// The decoded JSON does not conform to the benchmark's output schema.
    Validation(String),
}

impl RunFailure {
    pub fn message(&self) -> &str {
        match self {
            RunFailure::Provider(m) | RunFailure::Extraction(m) | RunFailure::Validation(m) => m,
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for RunFailure {}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}
