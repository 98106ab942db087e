pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS benchmarks (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  eval_method TEXT NOT NULL,
  input_schema_json TEXT NOT NULL,
  output_schema_json TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS examples (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  benchmark_id INTEGER NOT NULL REFERENCES benchmarks(id),
  inputs_json TEXT NOT NULL,
  expected_outputs_json TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS prompt_templates (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  benchmark_id INTEGER NOT NULL REFERENCES benchmarks(id),
  name TEXT NOT NULL,
  system_template TEXT NOT NULL,
  input_template TEXT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS benchmark_runs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  benchmark_id INTEGER NOT NULL REFERENCES benchmarks(id),
  model TEXT NOT NULL,
  prompt_template_id INTEGER NOT NULL REFERENCES prompt_templates(id),
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS example_runs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  example_id INTEGER NOT NULL REFERENCES examples(id),
  benchmark_run_id INTEGER NOT NULL REFERENCES benchmark_runs(id),
  outputs_json TEXT,
  success INTEGER,
  error TEXT,
  raw_prompt TEXT NOT NULL,
  raw_response TEXT,
  duration_ms INTEGER,
  created_at TEXT NOT NULL
);
"#;
