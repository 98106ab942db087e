use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// How a benchmark's outputs are judged: exact per-key string equality
/// (automatic) or deferred to a human rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMethod {
    Equality,
    Human,
}

impl EvalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalMethod::Equality => "equality",
            EvalMethod::Human => "human",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equality" => Some(EvalMethod::Equality),
            "human" => Some(EvalMethod::Human),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }
}

/// One entry of an input or output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
}

/// Variable name -> declared type and description.
pub type Schema = BTreeMap<String, FieldSpec>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    pub id: i64,
    pub name: String,
    pub eval_method: EvalMethod,
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub id: i64,
    pub benchmark_id: i64,
    pub inputs: JsonMap,
    pub expected_outputs: JsonMap,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: i64,
    pub benchmark_id: i64,
    pub name: String,
    pub system_template: String,
    pub input_template: Option<String>,
    pub created_at: String,
}

/// One execution of all of a benchmark's examples against one model and one
/// prompt template. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub id: i64,
    pub benchmark_id: i64,
    pub model: String,
    pub prompt_template_id: i64,
    pub created_at: String,
}

/// Outcome of one example run. PendingHumanReview means a human still has to
/// rate the output; it is the only state `evaluate` may transition out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessState {
    Pass,
    Fail,
    PendingHumanReview,
}

impl SuccessState {
    /// Stored as a nullable integer: 1, 0, or NULL for pending.
    pub fn to_column(self) -> Option<i64> {
        match self {
            SuccessState::Pass => Some(1),
            SuccessState::Fail => Some(0),
            SuccessState::PendingHumanReview => None,
        }
    }

    pub fn from_column(v: Option<i64>) -> Self {
        match v {
            Some(0) => SuccessState::Fail,
            Some(_) => SuccessState::Pass,
            None => SuccessState::PendingHumanReview,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SuccessState::PendingHumanReview)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleRun {
    pub id: i64,
    pub example_id: i64,
    pub benchmark_run_id: i64,
    pub outputs: Option<JsonMap>,
    pub success: SuccessState,
    pub error: Option<String>,
    pub raw_prompt: String,
    pub raw_response: Option<String>,
    pub duration_ms: Option<u64>,
    pub created_at: String,
}

/// Fields produced by executing one example, before persistence. Used both
/// for the initial insert and for a retry overwriting an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleRunRecord {
    pub outputs: Option<JsonMap>,
    pub success: SuccessState,
    pub error: Option<String>,
    pub raw_prompt: String,
    pub raw_response: Option<String>,
    pub duration_ms: Option<u64>,
}

/// What a completion provider hands back. Exactly one of `text`/`error` is
/// populated; `duration_ms` is wall-clock from request start to response
/// parse and is None whenever an error occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: Option<String>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
}

impl Completion {
    pub fn ok(text: String, duration_ms: u64) -> Self {
        Self {
            text: Some(text),
            error: None,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(error.into()),
            duration_ms: None,
        }
    }
}
