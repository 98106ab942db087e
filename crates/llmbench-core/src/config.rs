use crate::errors::ConfigError;
use crate::model::{EvalMethod, Schema};
use serde::Deserialize;
use std::path::Path;

/// A benchmark definition file: everything needed to create a benchmark.
/// Schemas are immutable once the benchmark exists.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkDefinition {
    pub name: String,
    pub eval_method: EvalMethod,
    pub input_schema: Schema,
    pub output_schema: Schema,
}

pub fn load_benchmark_definition(path: &Path) -> Result<BenchmarkDefinition, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ConfigError(format!(
            "failed to read benchmark definition {}: {}",
            path.display(),
            e
        ))
    })?;
    let definition: BenchmarkDefinition = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    if definition.name.trim().is_empty() {
        return Err(ConfigError("benchmark name is empty".into()));
    }
    if definition.input_schema.is_empty() {
        return Err(ConfigError("input_schema declares no variables".into()));
    }
    if definition.output_schema.is_empty() {
        return Err(ConfigError("output_schema declares no variables".into()));
    }

    Ok(definition)
}
