pub const BENCHMARK_YAML: &str = r#"name: "arithmetic"
eval_method: equality
input_schema:
  question:
    type: string
    description: "An arithmetic question the model should answer"
output_schema:
  answer:
    type: string
    description: "The numeric answer, as text"
"#;

pub const EXAMPLES_JSONL: &str = r#"{"inputs": {"question": "What is 2+2?"}, "expected_outputs": {"answer": "4"}}
{"inputs": {"question": "What is 7*6?"}, "expected_outputs": {"answer": "42"}}
"#;

pub const SYSTEM_TEMPLATE_TXT: &str = r#"You are a careful assistant. Answer the question and respond with a JSON
object containing a single "answer" key whose value is the answer as a
string. Respond with the JSON object only.

Question: {question}
"#;
