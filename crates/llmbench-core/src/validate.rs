use crate::errors::RunFailure;
use crate::model::{FieldType, JsonMap, Schema};
use serde_json::Value;

/// Validates a decoded completion against the benchmark's output schema.
/// Every declared key must be present with a value of its declared type;
/// keys the schema does not declare are stripped (scoring ignores them
/// regardless). Returns the validated object on success.
pub fn validate_outputs(schema: &Schema, value: &Value) -> Result<JsonMap, RunFailure> {
    let obj = value
        .as_object()
        .ok_or_else(|| RunFailure::Validation("LLM output is not a JSON object".to_string()))?;

    let mut validated = JsonMap::new();
    for (key, spec) in schema {
        let v = obj.get(key).ok_or_else(|| {
            RunFailure::Validation(format!("output is missing field `{}`", key))
        })?;
        if !matches_type(spec.field_type, v) {
            return Err(RunFailure::Validation(format!(
                "output field `{}` is not a valid {}",
                key,
                spec.field_type.as_str()
            )));
        }
        validated.insert(key.clone(), v.clone());
    }
    Ok(validated)
}

fn matches_type(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Date => is_dateish(value),
    }
}

// "date" accepts anything coercible to a date: RFC 3339 or YYYY-MM-DD
// strings, or a numeric epoch.
fn is_dateish(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            chrono::DateTime::parse_from_rfc3339(s).is_ok()
                || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        _ => false,
    }
}

/// Insert-time invariant for examples: keys must be exactly the schema's
/// keys; types are checked loosely, since bulk-imported values arrive as
/// text (a string form of a declared number or boolean is accepted).
pub fn check_example_fields(schema: &Schema, values: &JsonMap, what: &str) -> anyhow::Result<()> {
    for key in schema.keys() {
        if !values.contains_key(key) {
            anyhow::bail!("{} is missing field `{}`", what, key);
        }
    }
    for key in values.keys() {
        if !schema.contains_key(key) {
            anyhow::bail!("{} has undeclared field `{}`", what, key);
        }
    }
    for (key, spec) in schema {
        if !loosely_matches(spec.field_type, &values[key]) {
            anyhow::bail!(
                "{} field `{}` does not look like a {}",
                what,
                key,
                spec.field_type.as_str()
            );
        }
    }
    Ok(())
}

fn loosely_matches(field_type: FieldType, value: &Value) -> bool {
    if matches_type(field_type, value) {
        return true;
    }
    match (field_type, value) {
        // any scalar has a usable string form
        (FieldType::String, v) => !v.is_array() && !v.is_object() && !v.is_null(),
        (FieldType::Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
        (FieldType::Boolean, Value::String(s)) => matches!(s.trim(), "true" | "false"),
        _ => false,
    }
}
