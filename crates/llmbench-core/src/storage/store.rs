use crate::model::{
    Benchmark, BenchmarkRun, EvalMethod, Example, ExampleRun, ExampleRunRecord, JsonMap,
    PromptTemplate, Schema, SuccessState,
};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Repository over the benchmark tables. Cheap to clone; constructed by the
/// process entry point and injected into whatever needs it.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    // benchmarks

    pub fn create_benchmark(
        &self,
        name: &str,
        eval_method: EvalMethod,
        input_schema: &Schema,
        output_schema: &Schema,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO benchmarks(name, eval_method, input_schema_json, output_schema_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                eval_method.as_str(),
                serde_json::to_string(input_schema)?,
                serde_json::to_string(output_schema)?,
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn benchmark_by_id(&self, id: i64) -> anyhow::Result<Option<Benchmark>> {
        self.benchmark_where("id=?1", params![id])
    }

    pub fn benchmark_by_name(&self, name: &str) -> anyhow::Result<Option<Benchmark>> {
        self.benchmark_where("name=?1", params![name])
    }

    fn benchmark_where(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> anyhow::Result<Option<Benchmark>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, name, eval_method, input_schema_json, output_schema_json, created_at
             FROM benchmarks WHERE {}",
            clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        if let Some(row) = rows.next()? {
            Ok(Some(benchmark_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All benchmarks with their example counts, oldest first.
    pub fn list_benchmarks(&self) -> anyhow::Result<Vec<(Benchmark, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT b.id, b.name, b.eval_method, b.input_schema_json, b.output_schema_json, b.created_at,
                    (SELECT COUNT(*) FROM examples e WHERE e.benchmark_id = b.id)
             FROM benchmarks b ORDER BY b.id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let count: i64 = row.get(6)?;
            out.push((benchmark_from_row(row)?, count));
        }
        Ok(out)
    }

    // examples

    pub fn insert_example(
        &self,
        benchmark_id: i64,
        inputs: &JsonMap,
        expected_outputs: &JsonMap,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO examples(benchmark_id, inputs_json, expected_outputs_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                benchmark_id,
                serde_json::to_string(inputs)?,
                serde_json::to_string(expected_outputs)?,
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Bulk insert in one transaction; either every row lands or none do.
    pub fn insert_examples(
        &self,
        benchmark_id: i64,
        rows: &[(JsonMap, JsonMap)],
    ) -> anyhow::Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let created_at = now_rfc3339();
        for (inputs, expected_outputs) in rows {
            tx.execute(
                "INSERT INTO examples(benchmark_id, inputs_json, expected_outputs_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    benchmark_id,
                    serde_json::to_string(inputs)?,
                    serde_json::to_string(expected_outputs)?,
                    created_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn example_by_id(&self, id: i64) -> anyhow::Result<Option<Example>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, benchmark_id, inputs_json, expected_outputs_json, created_at
             FROM examples WHERE id=?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(example_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn examples_for_benchmark(&self, benchmark_id: i64) -> anyhow::Result<Vec<Example>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, benchmark_id, inputs_json, expected_outputs_json, created_at
             FROM examples WHERE benchmark_id=?1 ORDER BY id",
        )?;
        let mut rows = stmt.query(params![benchmark_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(example_from_row(row)?);
        }
        Ok(out)
    }

    // prompt templates

    pub fn create_prompt_template(
        &self,
        benchmark_id: i64,
        name: &str,
        system_template: &str,
        input_template: Option<&str>,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO prompt_templates(benchmark_id, name, system_template, input_template, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![benchmark_id, name, system_template, input_template, now_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn template_by_id(&self, id: i64) -> anyhow::Result<Option<PromptTemplate>> {
        self.template_where("id=?1", params![id])
    }

    pub fn template_by_name(
        &self,
        benchmark_id: i64,
        name: &str,
    ) -> anyhow::Result<Option<PromptTemplate>> {
        self.template_where("benchmark_id=?1 AND name=?2", params![benchmark_id, name])
    }

    fn template_where(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> anyhow::Result<Option<PromptTemplate>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, benchmark_id, name, system_template, input_template, created_at
             FROM prompt_templates WHERE {}",
            clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        if let Some(row) = rows.next()? {
            Ok(Some(template_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn templates_for_benchmark(
        &self,
        benchmark_id: i64,
    ) -> anyhow::Result<Vec<PromptTemplate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, benchmark_id, name, system_template, input_template, created_at
             FROM prompt_templates WHERE benchmark_id=?1 ORDER BY id",
        )?;
        let mut rows = stmt.query(params![benchmark_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(template_from_row(row)?);
        }
        Ok(out)
    }

    // benchmark runs

    pub fn create_benchmark_run(
        &self,
        benchmark_id: i64,
        model: &str,
        prompt_template_id: i64,
    ) -> anyhow::Result<BenchmarkRun> {
        let created_at = now_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO benchmark_runs(benchmark_id, model, prompt_template_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![benchmark_id, model, prompt_template_id, created_at],
        )?;
        Ok(BenchmarkRun {
            id: conn.last_insert_rowid(),
            benchmark_id,
            model: model.to_string(),
            prompt_template_id,
            created_at,
        })
    }

    pub fn benchmark_run_by_id(&self, id: i64) -> anyhow::Result<Option<BenchmarkRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, benchmark_id, model, prompt_template_id, created_at
             FROM benchmark_runs WHERE id=?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(BenchmarkRun {
                id: row.get(0)?,
                benchmark_id: row.get(1)?,
                model: row.get(2)?,
                prompt_template_id: row.get(3)?,
                created_at: row.get(4)?,
            }))
        } else {
            Ok(None)
        }
    }

    // example runs

    pub fn insert_example_run(
        &self,
        example_id: i64,
        benchmark_run_id: i64,
        record: &ExampleRunRecord,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO example_runs(
                example_id, benchmark_run_id, outputs_json, success, error,
                raw_prompt, raw_response, duration_ms, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                example_id,
                benchmark_run_id,
                outputs_json(record)?,
                record.success.to_column(),
                record.error,
                record.raw_prompt,
                record.raw_response,
                record.duration_ms.map(|v| v as i64),
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Retry semantics: the row is replaced in place, no history of prior
    /// attempts is retained.
    pub fn overwrite_example_run(
        &self,
        id: i64,
        record: &ExampleRunRecord,
    ) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE example_runs SET
                outputs_json=?1, success=?2, error=?3, raw_prompt=?4,
                raw_response=?5, duration_ms=?6
             WHERE id=?7",
            params![
                outputs_json(record)?,
                record.success.to_column(),
                record.error,
                record.raw_prompt,
                record.raw_response,
                record.duration_ms.map(|v| v as i64),
                id,
            ],
        )?;
        Ok(())
    }

    /// Human evaluation touches nothing but the success flag.
    pub fn set_example_run_success(&self, id: i64, success: SuccessState) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE example_runs SET success=?1 WHERE id=?2",
            params![success.to_column(), id],
        )?;
        Ok(())
    }

    pub fn example_run_by_id(&self, id: i64) -> anyhow::Result<Option<ExampleRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} WHERE id=?1", SELECT_EXAMPLE_RUN))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(example_run_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn example_runs_for_run(&self, benchmark_run_id: i64) -> anyhow::Result<Vec<ExampleRun>> {
        self.example_runs_where("benchmark_run_id=?1", params![benchmark_run_id])
    }

    /// Rows still awaiting human evaluation for one benchmark run.
    pub fn pending_example_runs(&self, benchmark_run_id: i64) -> anyhow::Result<Vec<ExampleRun>> {
        self.example_runs_where(
            "benchmark_run_id=?1 AND success IS NULL",
            params![benchmark_run_id],
        )
    }

    fn example_runs_where(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> anyhow::Result<Vec<ExampleRun>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{} WHERE {} ORDER BY id", SELECT_EXAMPLE_RUN, clause);
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(example_run_from_row(row)?);
        }
        Ok(out)
    }
}

const SELECT_EXAMPLE_RUN: &str = "SELECT id, example_id, benchmark_run_id, outputs_json, success, error, raw_prompt, raw_response, duration_ms, created_at FROM example_runs";

fn outputs_json(record: &ExampleRunRecord) -> anyhow::Result<Option<String>> {
    record
        .outputs
        .as_ref()
        .map(|o| serde_json::to_string(o))
        .transpose()
        .map_err(Into::into)
}

fn benchmark_from_row(row: &rusqlite::Row<'_>) -> anyhow::Result<Benchmark> {
    let eval_method: String = row.get(2)?;
    let input_schema: String = row.get(3)?;
    let output_schema: String = row.get(4)?;
    Ok(Benchmark {
        id: row.get(0)?,
        name: row.get(1)?,
        eval_method: EvalMethod::parse(&eval_method)
            .ok_or_else(|| anyhow::anyhow!("unknown eval method in benchmarks table: {}", eval_method))?,
        input_schema: serde_json::from_str(&input_schema)?,
        output_schema: serde_json::from_str(&output_schema)?,
        created_at: row.get(5)?,
    })
}

fn example_from_row(row: &rusqlite::Row<'_>) -> anyhow::Result<Example> {
    let inputs: String = row.get(2)?;
    let expected_outputs: String = row.get(3)?;
    Ok(Example {
        id: row.get(0)?,
        benchmark_id: row.get(1)?,
        inputs: serde_json::from_str(&inputs)?,
        expected_outputs: serde_json::from_str(&expected_outputs)?,
        created_at: row.get(4)?,
    })
}

fn template_from_row(row: &rusqlite::Row<'_>) -> anyhow::Result<PromptTemplate> {
    Ok(PromptTemplate {
        id: row.get(0)?,
        benchmark_id: row.get(1)?,
        name: row.get(2)?,
        system_template: row.get(3)?,
        input_template: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn example_run_from_row(row: &rusqlite::Row<'_>) -> anyhow::Result<ExampleRun> {
    let outputs: Option<String> = row.get(3)?;
    let success: Option<i64> = row.get(4)?;
    let duration_ms: Option<i64> = row.get(8)?;
    Ok(ExampleRun {
        id: row.get(0)?,
        example_id: row.get(1)?,
        benchmark_run_id: row.get(2)?,
        outputs: outputs.as_deref().map(serde_json::from_str).transpose()?,
        success: SuccessState::from_column(success),
        error: row.get(5)?,
        raw_prompt: row.get(6)?,
        raw_response: row.get(7)?,
        duration_ms: duration_ms.map(|v| v as u64),
        created_at: row.get(9)?,
    })
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
