use crate::model::{JsonMap, Schema};

/// Renders `{var}` placeholders in a template. Substitution targets are the
/// variables both declared in the benchmark's input schema and textually
/// present in the template; any other brace sequence is left as literal
/// text. Values pass through verbatim, no escaping.
pub fn render(template: &str, input_schema: &Schema, inputs: &JsonMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail.find('}') {
            Some(close) => {
                let name = &tail[1..close];
                if input_schema.contains_key(name) {
                    if let Some(value) = inputs.get(name) {
                        out.push_str(&value_text(value));
                        rest = &tail[close + 1..];
                        continue;
                    }
                }
                // not a registered variable: emit the `{` and keep scanning
                out.push('{');
                rest = &tail[1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// String form of an input value: strings unquoted, everything else in its
/// JSON rendering.
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Non-chat providers take a single prompt; this is also the persisted
/// `raw_prompt` form.
pub fn concat_prompts(system_prompt: &str, input_prompt: &str) -> String {
    format!("{}\n\n{}", system_prompt, input_prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSpec, FieldType};
    use serde_json::json;

    fn schema(names: &[&str]) -> Schema {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    FieldSpec {
                        field_type: FieldType::String,
                        description: String::new(),
                    },
                )
            })
            .collect()
    }

    fn inputs(pairs: &[(&str, serde_json::Value)]) -> JsonMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn substitutes_declared_variables() {
        let out = render(
            "Q: {question} A:",
            &schema(&["question"]),
            &inputs(&[("question", json!("2+2?"))]),
        );
        assert_eq!(out, "Q: 2+2? A:");
    }

    #[test]
    fn substitutes_every_occurrence() {
        let out = render(
            "{x} and {x}",
            &schema(&["x"]),
            &inputs(&[("x", json!("a"))]),
        );
        assert_eq!(out, "a and a");
    }

    #[test]
    fn undeclared_placeholders_stay_literal() {
        let out = render(
            "{question} {format}",
            &schema(&["question"]),
            &inputs(&[("question", json!("hi")), ("format", json!("json"))]),
        );
        assert_eq!(out, "hi {format}");
    }

    #[test]
    fn non_string_values_use_json_form() {
        let out = render(
            "n={n} b={b}",
            &schema(&["n", "b"]),
            &inputs(&[("n", json!(42)), ("b", json!(true))]),
        );
        assert_eq!(out, "n=42 b=true");
    }

    #[test]
    fn stray_braces_pass_through() {
        let s = schema(&["x"]);
        let m = inputs(&[("x", json!("v"))]);
        assert_eq!(render("{{x} {", &s, &m), "{v {");
        assert_eq!(render("no placeholders", &s, &m), "no placeholders");
        assert_eq!(render("{unclosed", &s, &m), "{unclosed");
    }

    #[test]
    fn concat_joins_with_blank_line() {
        assert_eq!(concat_prompts("sys", "inp"), "sys\n\ninp");
        assert_eq!(concat_prompts("sys", ""), "sys\n\n");
    }
}
