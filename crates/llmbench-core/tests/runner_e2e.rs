use async_trait::async_trait;
use llmbench_core::engine::runner::RunExecutor;
use llmbench_core::model::{
    Completion, EvalMethod, FieldSpec, FieldType, JsonMap, Schema, SuccessState,
};
use llmbench_core::providers::{CompletionProvider, ProviderRegistry};
use llmbench_core::storage::Store;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

/// Deterministic provider keyed off the model id; network-free stand-in for
/// the real vendors.
struct ScriptedProvider;

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, model: &str, _system_prompt: &str, _input_prompt: &str) -> Completion {
        match model {
            "stub/json" => Completion::ok("Sure! {\"answer\":\"4\"}".to_string(), 7),
            "stub/prose" => Completion::ok("I don't know.".to_string(), 7),
            "stub/typed" => Completion::ok("{\"answer\": 4}".to_string(), 7),
            "stub/error" => Completion::failed("upstream unavailable"),
            other => Completion::failed(format!("unscripted model: {}", other)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }

    fn models(&self) -> Vec<String> {
        ["stub/json", "stub/prose", "stub/typed", "stub/error"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }
}

fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(ScriptedProvider));
    registry
}

fn schema(fields: &[(&str, FieldType)]) -> Schema {
    fields
        .iter()
        .map(|(name, ty)| {
            (
                name.to_string(),
                FieldSpec {
                    field_type: *ty,
                    description: String::new(),
                },
            )
        })
        .collect()
}

fn map(v: serde_json::Value) -> JsonMap {
    v.as_object().unwrap().clone()
}

struct Fixture {
    store: Store,
    benchmark_id: i64,
    template_id: i64,
}

fn fixture(dir: &Path, eval_method: EvalMethod) -> anyhow::Result<Fixture> {
    let store = Store::open(&dir.join("bench.db"))?;
    store.init_schema()?;

    let benchmark_id = store.create_benchmark(
        "arithmetic",
        eval_method,
        &schema(&[("question", FieldType::String)]),
        &schema(&[("answer", FieldType::String)]),
    )?;
    store.insert_example(
        benchmark_id,
        &map(json!({"question": "2+2?"})),
        &map(json!({"answer": "4"})),
    )?;
    let template_id = store.create_prompt_template(
        benchmark_id,
        "default",
        "Answer with JSON: {question}",
        Some("Q: {question}"),
    )?;

    Ok(Fixture {
        store,
        benchmark_id,
        template_id,
    })
}

#[tokio::test]
async fn run_succeeds_on_prose_wrapped_json() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/json", f.template_id)
        .await?;

    assert_eq!(report.results.len(), 1);
    let row = &report.results[0];
    assert_eq!(row.success, SuccessState::Pass);
    assert_eq!(row.outputs.as_ref().unwrap()["answer"], "4");
    assert!(row.error.is_none());
    assert_eq!(row.raw_prompt, "Answer with JSON: 2+2?\n\nQ: 2+2?");
    assert_eq!(row.raw_response.as_deref(), Some("Sure! {\"answer\":\"4\"}"));
    assert_eq!(row.duration_ms, Some(7));
    Ok(())
}

#[tokio::test]
async fn run_records_extraction_failure() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/prose", f.template_id)
        .await?;

    let row = &report.results[0];
    assert_eq!(row.success, SuccessState::Fail);
    assert!(row.outputs.is_none());
    assert_eq!(
        row.error.as_deref(),
        Some("Failed to find JSON in LLM response")
    );
    assert_eq!(row.raw_response.as_deref(), Some("I don't know."));
    Ok(())
}

#[tokio::test]
async fn run_records_validation_failure() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    // the stub answers with a number where the schema declares a string
    let report = executor
        .run_benchmark(f.benchmark_id, "stub/typed", f.template_id)
        .await?;

    let row = &report.results[0];
    assert_eq!(row.success, SuccessState::Fail);
    assert!(row.outputs.is_none());
    assert!(row.error.as_deref().unwrap().contains("answer"));
    Ok(())
}

#[tokio::test]
async fn provider_errors_are_recorded_per_row_and_the_run_continues() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    f.store.insert_example(
        f.benchmark_id,
        &map(json!({"question": "7*6?"})),
        &map(json!({"answer": "42"})),
    )?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/error", f.template_id)
        .await?;

    assert_eq!(report.results.len(), 2);
    for row in &report.results {
        assert_eq!(row.success, SuccessState::Fail);
        assert_eq!(row.error.as_deref(), Some("upstream unavailable"));
        assert!(row.raw_response.is_none());
        assert!(row.duration_ms.is_none());
        assert!(row.outputs.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn unknown_model_is_fatal() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let err = executor
        .run_benchmark(f.benchmark_id, "nobody/nothing", f.template_id)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown model"));
    Ok(())
}

#[tokio::test]
async fn human_benchmarks_stay_pending_until_evaluated() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Human)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/json", f.template_id)
        .await?;
    let row = &report.results[0];
    assert_eq!(row.success, SuccessState::PendingHumanReview);
    assert_eq!(row.outputs.as_ref().unwrap()["answer"], "4");

    assert!(executor.evaluate(row.id, true)?);
    let rated = f.store.example_run_by_id(row.id)?.unwrap();
    assert_eq!(rated.success, SuccessState::Pass);
    // outputs and raw fields untouched
    assert_eq!(rated.outputs.as_ref().unwrap()["answer"], "4");
    assert_eq!(rated.raw_response, row.raw_response);

    // a second rating is refused
    assert!(!executor.evaluate(row.id, false)?);
    let still = f.store.example_run_by_id(row.id)?.unwrap();
    assert_eq!(still.success, SuccessState::Pass);
    Ok(())
}

#[tokio::test]
async fn human_benchmarks_stay_pending_even_on_failure() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Human)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/error", f.template_id)
        .await?;
    assert_eq!(
        report.results[0].success,
        SuccessState::PendingHumanReview
    );
    Ok(())
}

#[tokio::test]
async fn retry_is_idempotent_and_overwrites_in_place() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let report = executor
        .run_benchmark(f.benchmark_id, "stub/json", f.template_id)
        .await?;
    let original = &report.results[0];

    let first = executor.retry(original.id).await?;
    let second = executor.retry(original.id).await?;

    assert_eq!(first.id, original.id);
    assert_eq!(second.id, original.id);
    assert_eq!(first.success, second.success);
    assert_eq!(first.outputs, second.outputs);
    assert_eq!(first.error, second.error);
    assert_eq!(first.raw_prompt, second.raw_prompt);
    assert_eq!(first.raw_response, second.raw_response);

    let rows = f.store.example_runs_for_run(report.benchmark_run.id)?;
    assert_eq!(rows.len(), 1);
    Ok(())
}

#[tokio::test]
async fn retry_of_a_missing_run_is_fatal() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let f = fixture(dir.path(), EvalMethod::Equality)?;
    let executor = RunExecutor::new(f.store.clone(), registry());

    let err = executor.retry(9999).await.unwrap_err();
    assert!(err.to_string().contains("no such example run"));
    Ok(())
}
